pub mod classifier;
pub mod comparator;
pub mod config;
pub mod error;
pub mod extractor;
pub mod schema_object;
pub mod source_code;
pub mod summary;
pub mod utils;

use std::path::Path;

pub use comparator::{Comparator, ComparisonResult, ComparisonStatus};
pub use config::CompareConfig;
pub use error::{Error, Result};
pub use schema_object::{Cte, Join, ObjectType, SchemaObject, SourceSpan};
pub use source_code::{parse_source, read_source_file, read_source_files, split_statements};
pub use summary::{critical_issues, ComparisonSummary, StatusTally};

/// Loads the reference and candidate SQL files and compares the two object sets.
///
/// Each side may span several files; their objects are concatenated in argument order.
/// Unreadable files are logged and skipped, so a side whose files all fail to load is simply
/// empty and every object of the other side is reported as missing or extra.
pub fn compare_sources<P: AsRef<Path>, Q: AsRef<Path>>(
    reference_paths: &[P],
    candidate_paths: &[Q],
    config: &CompareConfig,
) -> Vec<ComparisonResult> {
    let reference = read_source_files(reference_paths);
    let candidate = read_source_files(candidate_paths);
    log::info!(
        "Comparing {} {} objects against {} {} objects",
        reference.len(),
        config.reference_label,
        candidate.len(),
        config.candidate_label
    );

    Comparator::with_config(config.clone()).compare(&reference, &candidate)
}
