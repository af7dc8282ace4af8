//! Configuration handling for sqldrift

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Load a comparison configuration from a JSON file.
///
/// Every field is optional in the file; missing fields keep their defaults.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<CompareConfig> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config: CompareConfig = serde_json::from_str(&config_str)?;
    Ok(config)
}

/// Configuration for object comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Label of the reference side in findings and diff headers
    pub reference_label: String,
    /// Label of the candidate side in findings and diff headers
    pub candidate_label: String,
    /// Unchanged lines kept around each hunk of the line diff
    pub diff_context_lines: usize,
    /// Completeness below which a missing or different object is critical
    pub critical_completeness_threshold: f64,
    /// Compare clause texts, join conditions, CTE definitions and parameters with whitespace
    /// runs collapsed, so re-indentation alone is not a finding
    pub ignore_whitespace: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            reference_label: "source".to_string(),
            candidate_label: "docker".to_string(),
            diff_context_lines: 3,
            critical_completeness_threshold: 80.0,
            ignore_whitespace: false,
        }
    }
}

impl CompareConfig {
    /// Creates a new config with default labels and limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the labels used for the reference and candidate sides
    pub fn with_labels(mut self, reference: impl Into<String>, candidate: impl Into<String>) -> Self {
        self.reference_label = reference.into();
        self.candidate_label = candidate.into();
        self
    }

    /// Sets the number of context lines in the line diff
    pub fn with_diff_context(mut self, lines: usize) -> Self {
        self.diff_context_lines = lines;
        self
    }

    /// Sets the completeness threshold for critical issues
    pub fn with_critical_threshold(mut self, threshold: f64) -> Self {
        self.critical_completeness_threshold = threshold;
        self
    }

    /// Sets whether layout-only differences in clause texts are ignored
    pub fn with_ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }
}
