//! Structural comparison of a reference object set against a candidate object set.
//!
//! Objects are paired by name. Each pair goes through a fixed sequence of checks (kind,
//! columns, CTEs, joins, clauses, comments and function signature) that produce human-readable
//! findings, then gets a completeness score, an accuracy score and a unified line diff.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, TextDiff};

use crate::config::CompareConfig;
use crate::schema_object::{Cte, Join, ObjectType, SchemaObject};
use crate::utils::collapse_whitespace;

/// Time allowed for the character diff behind one accuracy score. Past it the diff falls back
/// to a coarser edit script, so the score becomes an approximation.
const ACCURACY_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonStatus {
    /// Present on both sides with no structural findings.
    Match,
    /// Present on both sides with at least one finding.
    Different,
    /// Present in the reference only.
    Missing,
    /// Present in the candidate only.
    Extra,
}

impl ComparisonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonStatus::Match => "MATCH",
            ComparisonStatus::Different => "DIFFERENT",
            ComparisonStatus::Missing => "MISSING",
            ComparisonStatus::Extra => "EXTRA",
        }
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing one object name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub name: String,
    /// Kind of the reference object, or of the candidate object when only it exists.
    pub kind: ObjectType,
    pub status: ComparisonStatus,
    /// Share of the reference's structural items reproduced by the candidate, 0 to 100.
    pub completeness_pct: f64,
    /// Character-level similarity of the whitespace-normalized texts, 0 to 100.
    pub accuracy_pct: f64,
    pub differences: Vec<String>,
    pub missing_components: Vec<String>,
    pub extra_components: Vec<String>,
    /// Unified diff of the raw texts, one entry per line; empty when the texts are equal.
    pub line_diff: Vec<String>,
}

#[derive(Debug, Default)]
struct Findings {
    differences: Vec<String>,
    missing: Vec<String>,
    extra: Vec<String>,
}

/// Compares object sets according to a [`CompareConfig`].
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: CompareConfig,
}

impl Comparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompareConfig) -> Self {
        Comparator { config }
    }

    /// Compares every object name of either side.
    ///
    /// Results follow the reference order, then the candidate-only names in candidate order.
    /// When a name is defined twice on one side, the later definition is used.
    pub fn compare(
        &self,
        reference: &[SchemaObject],
        candidate: &[SchemaObject],
    ) -> Vec<ComparisonResult> {
        let reference_index = index_by_name(reference, &self.config.reference_label);
        let candidate_index = index_by_name(candidate, &self.config.candidate_label);

        let mut results = Vec::with_capacity(reference_index.len() + candidate_index.len());
        for (name, source) in &reference_index {
            results.push(match candidate_index.get(name) {
                Some(target) => self.compare_pair(source, target),
                None => self.missing(source),
            });
        }
        for (name, target) in &candidate_index {
            if !reference_index.contains_key(name) {
                results.push(self.extra(target));
            }
        }

        log::debug!(
            "Compared {} reference and {} candidate objects",
            reference_index.len(),
            candidate_index.len()
        );
        results
    }

    fn compare_pair(&self, source: &SchemaObject, target: &SchemaObject) -> ComparisonResult {
        let source = self.comparable(source);
        let target = self.comparable(target);
        let (source, target) = (source.as_ref(), target.as_ref());
        let mut findings = Findings::default();

        if source.kind != target.kind {
            findings.differences.push(format!(
                "Type mismatch: {}={}, {}={}",
                self.config.reference_label, source.kind, self.config.candidate_label, target.kind
            ));
        }
        compare_columns(&source.columns, &target.columns, &mut findings);
        compare_ctes(&source.ctes, &target.ctes, &mut findings);
        compare_joins(&source.joins, &target.joins, &mut findings);
        self.compare_clause("WHERE", &source.where_clause, &target.where_clause, &mut findings);
        self.compare_clause("GROUP BY", &source.group_by, &target.group_by, &mut findings);
        self.compare_clause("ORDER BY", &source.order_by, &target.order_by, &mut findings);
        compare_comments(&source.comments, &target.comments, &mut findings);
        if source.kind == ObjectType::Function {
            self.compare_signature(source, target, &mut findings);
        }

        let status = if findings.differences.is_empty() {
            ComparisonStatus::Match
        } else {
            ComparisonStatus::Different
        };

        ComparisonResult {
            name: source.name.clone(),
            kind: source.kind,
            status,
            completeness_pct: completeness(source, target),
            accuracy_pct: accuracy(&source.raw_text, &target.raw_text),
            differences: findings.differences,
            missing_components: findings.missing,
            extra_components: findings.extra,
            line_diff: self.line_diff(&source.raw_text, &target.raw_text),
        }
    }

    /// The object as the structural checks see it. With `ignore_whitespace` set, clause texts,
    /// join conditions, CTE definitions and parameters are whitespace-collapsed first.
    fn comparable<'a>(&self, object: &'a SchemaObject) -> Cow<'a, SchemaObject> {
        if !self.config.ignore_whitespace {
            return Cow::Borrowed(object);
        }
        let mut object = object.clone();
        for cte in &mut object.ctes {
            cte.definition = collapse_whitespace(&cte.definition);
        }
        for join in &mut object.joins {
            join.condition = join.condition.as_deref().map(collapse_whitespace);
        }
        for clause in [&mut object.where_clause, &mut object.group_by, &mut object.order_by] {
            *clause = clause.as_deref().map(collapse_whitespace);
        }
        for parameter in &mut object.parameters {
            *parameter = collapse_whitespace(parameter);
        }
        Cow::Owned(object)
    }

    fn missing(&self, source: &SchemaObject) -> ComparisonResult {
        ComparisonResult {
            name: source.name.clone(),
            kind: source.kind,
            status: ComparisonStatus::Missing,
            completeness_pct: 0.0,
            accuracy_pct: 0.0,
            differences: vec![format!(
                "Object '{}' exists in {} but missing in {}",
                source.name, self.config.reference_label, self.config.candidate_label
            )],
            missing_components: Vec::new(),
            extra_components: Vec::new(),
            line_diff: self.line_diff(&source.raw_text, ""),
        }
    }

    fn extra(&self, target: &SchemaObject) -> ComparisonResult {
        ComparisonResult {
            name: target.name.clone(),
            kind: target.kind,
            status: ComparisonStatus::Extra,
            completeness_pct: 0.0,
            accuracy_pct: 0.0,
            differences: vec![format!(
                "Object '{}' exists in {} but not in {}",
                target.name, self.config.candidate_label, self.config.reference_label
            )],
            missing_components: Vec::new(),
            extra_components: Vec::new(),
            line_diff: self.line_diff("", &target.raw_text),
        }
    }

    fn compare_clause(
        &self,
        clause: &str,
        source: &Option<String>,
        target: &Option<String>,
        findings: &mut Findings,
    ) {
        let finding = match (source, target) {
            (Some(_), None) => format!("Missing {} clause in {}", clause, self.config.candidate_label),
            (None, Some(_)) => format!("Missing {} clause in {}", clause, self.config.reference_label),
            (Some(source), Some(target)) if source != target => format!("{} clause differs", clause),
            _ => return,
        };
        findings.differences.push(finding);
    }

    fn compare_signature(&self, source: &SchemaObject, target: &SchemaObject, findings: &mut Findings) {
        if source.parameters != target.parameters {
            findings.differences.push("Function parameters differ".to_string());
            let source_set = as_set(&source.parameters);
            let target_set = as_set(&target.parameters);
            for parameter in only_in(&source.parameters, &target_set) {
                findings.missing.push(format!("Missing parameter: {}", parameter));
            }
            for parameter in only_in(&target.parameters, &source_set) {
                findings.extra.push(format!("Extra parameter: {}", parameter));
            }
        }
        if source.return_type != target.return_type {
            findings.differences.push(format!(
                "Return type differs: {}={}, {}={}",
                self.config.reference_label,
                source.return_type.as_deref().unwrap_or("none"),
                self.config.candidate_label,
                target.return_type.as_deref().unwrap_or("none")
            ));
        }
    }

    /// Unified diff of two texts, labelled with the configured side names.
    pub fn line_diff(&self, source: &str, target: &str) -> Vec<String> {
        let source = terminate_lines(source);
        let target = terminate_lines(target);
        let diff = TextDiff::from_lines(&source, &target);
        let mut unified = diff.unified_diff();
        unified
            .context_radius(self.config.diff_context_lines)
            .header(&self.config.reference_label, &self.config.candidate_label);
        unified.to_string().lines().map(str::to_string).collect()
    }
}

fn index_by_name<'a>(objects: &'a [SchemaObject], label: &str) -> IndexMap<&'a str, &'a SchemaObject> {
    let mut index = IndexMap::with_capacity(objects.len());
    for object in objects {
        if index.insert(object.name.as_str(), object).is_some() {
            log::warn!(
                "'{}' is defined more than once in {}; using the last definition",
                object.name,
                label
            );
        }
    }
    index
}

fn as_set(items: &[String]) -> HashSet<&str> {
    items.iter().map(String::as_str).collect()
}

/// Items absent from `other`, deduplicated, in their original order.
fn only_in<'a>(items: &'a [String], other: &HashSet<&str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(String::as_str)
        .filter(|item| !other.contains(*item) && seen.insert(*item))
        .collect()
}

fn compare_columns(source: &[String], target: &[String], findings: &mut Findings) {
    let missing = only_in(source, &as_set(target));
    let extra = only_in(target, &as_set(source));

    if !missing.is_empty() {
        findings.differences.push(format!("Missing columns: {}", missing.join(", ")));
        findings
            .missing
            .extend(missing.iter().map(|column| format!("Missing column: {}", column)));
    }
    if !extra.is_empty() {
        findings.differences.push(format!("Extra columns: {}", extra.join(", ")));
        findings
            .extra
            .extend(extra.iter().map(|column| format!("Extra column: {}", column)));
    }
    if missing.is_empty() && extra.is_empty() && source != target {
        findings.differences.push("Column order differs".to_string());
    }
}

fn compare_ctes(source: &[Cte], target: &[Cte], findings: &mut Findings) {
    let source_names: Vec<String> = source.iter().map(|cte| cte.name.clone()).collect();
    let target_names: Vec<String> = target.iter().map(|cte| cte.name.clone()).collect();
    let missing = only_in(&source_names, &as_set(&target_names));
    let extra = only_in(&target_names, &as_set(&source_names));

    if !missing.is_empty() {
        findings.differences.push(format!("Missing CTEs: {}", missing.join(", ")));
        findings
            .missing
            .extend(missing.iter().map(|name| format!("Missing CTE: {}", name)));
    }
    if !extra.is_empty() {
        findings.differences.push(format!("Extra CTEs: {}", extra.join(", ")));
        findings
            .extra
            .extend(extra.iter().map(|name| format!("Extra CTE: {}", name)));
    }

    let mut checked = HashSet::new();
    for cte in source {
        if !checked.insert(cte.name.as_str()) {
            continue;
        }
        if let Some(other) = target.iter().find(|other| other.name == cte.name) {
            if other.definition != cte.definition {
                findings
                    .differences
                    .push(format!("CTE '{}' definition differs", cte.name));
            }
        }
    }
}

fn compare_joins(source: &[Join], target: &[Join], findings: &mut Findings) {
    let source_keys: HashSet<(&str, &str)> = source.iter().map(Join::key).collect();
    let target_keys: HashSet<(&str, &str)> = target.iter().map(Join::key).collect();

    let missing = source_keys.difference(&target_keys).count();
    if missing > 0 {
        findings.differences.push(format!("Missing JOINs: {}", missing));
    }
    let extra = target_keys.difference(&source_keys).count();
    if extra > 0 {
        findings.differences.push(format!("Extra JOINs: {}", extra));
    }

    // components carry the full join text, condition included
    let source_joins: Vec<String> = source.iter().map(ToString::to_string).collect();
    let target_joins: Vec<String> = target.iter().map(ToString::to_string).collect();
    for join in only_in(&source_joins, &as_set(&target_joins)) {
        findings.missing.push(format!("Missing JOIN: {}", join));
    }
    for join in only_in(&target_joins, &as_set(&source_joins)) {
        findings.extra.push(format!("Extra JOIN: {}", join));
    }
}

fn compare_comments(source: &[String], target: &[String], findings: &mut Findings) {
    let source_set = as_set(source);
    let target_set = as_set(target);

    let missing = source_set.difference(&target_set).count();
    if missing > 0 {
        findings.differences.push(format!("Missing comments: {}", missing));
    }
    let extra = target_set.difference(&source_set).count();
    if extra > 0 {
        findings.differences.push(format!("Extra comments: {}", extra));
    }
}

/// Percentage of the reference's columns, CTE names, join keys and present clauses that the
/// candidate reproduces. A reference without any of these scores 100.
fn completeness(source: &SchemaObject, target: &SchemaObject) -> f64 {
    let mut total = 0;
    let mut matched = 0;

    let target_columns = as_set(&target.columns);
    total += source.columns.len();
    matched += source
        .columns
        .iter()
        .filter(|column| target_columns.contains(column.as_str()))
        .count();

    let target_ctes: HashSet<&str> = target.ctes.iter().map(|cte| cte.name.as_str()).collect();
    total += source.ctes.len();
    matched += source
        .ctes
        .iter()
        .filter(|cte| target_ctes.contains(cte.name.as_str()))
        .count();

    let target_joins: HashSet<(&str, &str)> = target.joins.iter().map(Join::key).collect();
    total += source.joins.len();
    matched += source
        .joins
        .iter()
        .filter(|join| target_joins.contains(&join.key()))
        .count();

    for (source_clause, target_clause) in [
        (&source.where_clause, &target.where_clause),
        (&source.group_by, &target.group_by),
        (&source.order_by, &target.order_by),
    ] {
        if source_clause.is_some() {
            total += 1;
            if source_clause == target_clause {
                matched += 1;
            }
        }
    }

    if total == 0 {
        100.0
    } else {
        matched as f64 / total as f64 * 100.0
    }
}

/// Longest-common-subsequence similarity of the whitespace-collapsed texts, as a percentage.
fn accuracy(source: &str, target: &str) -> f64 {
    let source = collapse_whitespace(source);
    let target = collapse_whitespace(target);
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .deadline(Instant::now() + ACCURACY_TIMEOUT)
        .diff_chars(&source, &target);
    f64::from(diff.ratio()) * 100.0
}

fn terminate_lines(text: &str) -> String {
    text.lines().map(|line| format!("{}\n", line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_code::{parse_source, read_source_file};

    fn parse_one(sql: &str) -> SchemaObject {
        parse_source(sql).remove(0)
    }

    #[test]
    fn test_identical_objects_match() {
        let sql = "CREATE OR REPLACE VIEW v AS SELECT a, b FROM t LEFT JOIN u ON u.id = t.id WHERE x=1";
        let results = Comparator::new().compare(&[parse_one(sql)], &[parse_one(sql)]);

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.status, ComparisonStatus::Match);
        assert_eq!(result.completeness_pct, 100.0);
        assert_eq!(result.accuracy_pct, 100.0);
        assert!(result.differences.is_empty());
        assert!(result.missing_components.is_empty());
        assert!(result.extra_components.is_empty());
        assert!(result.line_diff.is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(Comparator::new().compare(&[], &[]).is_empty());
    }

    #[test]
    fn test_missing_and_extra_are_symmetric() {
        let view = parse_one("CREATE VIEW claims.v AS SELECT a FROM t");
        let comparator = Comparator::new();

        let missing = comparator.compare(&[view.clone()], &[]);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].status, ComparisonStatus::Missing);
        assert_eq!(missing[0].completeness_pct, 0.0);
        assert_eq!(missing[0].accuracy_pct, 0.0);
        assert_eq!(
            missing[0].differences,
            vec!["Object 'claims.v' exists in source but missing in docker"]
        );
        assert!(missing[0].line_diff.iter().any(|line| line == "-CREATE VIEW claims.v AS SELECT a FROM t"));

        let extra = comparator.compare(&[], &[view]);
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].status, ComparisonStatus::Extra);
        assert_eq!(
            extra[0].differences,
            vec!["Object 'claims.v' exists in docker but not in source"]
        );
        assert!(extra[0].line_diff.iter().any(|line| line == "+CREATE VIEW claims.v AS SELECT a FROM t"));
    }

    #[test]
    fn test_result_order() {
        let reference = parse_source("CREATE TABLE b (id int); CREATE TABLE a (id int);");
        let candidate = parse_source("CREATE TABLE z (id int); CREATE TABLE a (id int);");
        let names: Vec<String> = Comparator::new()
            .compare(&reference, &candidate)
            .into_iter()
            .map(|result| result.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "z"]);
    }

    #[test]
    fn test_duplicate_name_uses_last_definition() {
        let reference = parse_source("CREATE VIEW v AS SELECT a FROM t; CREATE OR REPLACE VIEW v AS SELECT a, b FROM t;");
        let candidate = parse_source("CREATE VIEW v AS SELECT a, b FROM t;");
        let results = Comparator::new().compare(&reference, &candidate);
        assert_eq!(results.len(), 1);
        assert!(results[0].differences.iter().all(|d| !d.contains("column")));
    }

    #[test]
    fn test_column_order_only() {
        let source = parse_one("CREATE VIEW v AS SELECT a, b FROM t");
        let target = parse_one("CREATE VIEW v AS SELECT b, a FROM t");
        let result = &Comparator::new().compare(&[source], &[target])[0];

        assert_eq!(result.status, ComparisonStatus::Different);
        assert_eq!(result.differences, vec!["Column order differs"]);
        assert_eq!(result.completeness_pct, 100.0);
        assert!(result.missing_components.is_empty());
    }

    #[test]
    fn test_table_missing_column() {
        let source = parse_one("CREATE TABLE t (id INT, name TEXT, PRIMARY KEY (id))");
        let target = parse_one("CREATE TABLE t (id INT, PRIMARY KEY (id))");
        let result = &Comparator::new().compare(&[source], &[target])[0];

        assert_eq!(result.status, ComparisonStatus::Different);
        assert_eq!(result.missing_components, vec!["Missing column: name"]);
        assert!(result.differences.contains(&"Missing columns: name".to_string()));
        assert_eq!(result.completeness_pct, 50.0);
        assert!(result.accuracy_pct < 100.0);
    }

    #[test]
    fn test_clause_findings_name_the_lacking_side() {
        let comparator = Comparator::new();
        let with_where = parse_one("CREATE VIEW v AS SELECT a FROM t WHERE a > 1");
        let without_where = parse_one("CREATE VIEW v AS SELECT a FROM t");
        let changed_where = parse_one("CREATE VIEW v AS SELECT a FROM t WHERE a > 2");

        let result = &comparator.compare(&[with_where.clone()], &[without_where.clone()])[0];
        assert_eq!(result.differences, vec!["Missing WHERE clause in docker"]);
        assert_eq!(result.completeness_pct, 50.0);

        let result = &comparator.compare(&[without_where], &[with_where.clone()])[0];
        assert_eq!(result.differences, vec!["Missing WHERE clause in source"]);
        assert_eq!(result.completeness_pct, 100.0);

        let result = &comparator.compare(&[with_where], &[changed_where])[0];
        assert_eq!(result.differences, vec!["WHERE clause differs"]);
    }

    #[test]
    fn test_join_findings() {
        let source = parse_one(
            "CREATE VIEW v AS SELECT a.id FROM a LEFT JOIN b ON b.id = a.id JOIN c ON c.id = a.id",
        );
        let target = parse_one(
            "CREATE VIEW v AS SELECT a.id FROM a LEFT JOIN b ON b.a_id = a.id INNER JOIN d ON d.id = a.id",
        );
        let result = &Comparator::new().compare(&[source], &[target])[0];

        assert_eq!(result.differences, vec!["Missing JOINs: 1", "Extra JOINs: 1"]);
        assert_eq!(
            result.missing_components,
            vec!["Missing JOIN: LEFT JOIN b ON b.id = a.id", "Missing JOIN: JOIN c ON c.id = a.id"]
        );
        assert_eq!(
            result.extra_components,
            vec!["Extra JOIN: LEFT JOIN b ON b.a_id = a.id", "Extra JOIN: INNER JOIN d ON d.id = a.id"]
        );
        // one column and one of two join keys reproduced
        assert!((result.completeness_pct - 2.0 / 3.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cte_findings() {
        let source = parse_one("CREATE VIEW v AS WITH x AS (SELECT 1 AS n), y AS (SELECT 2 AS n) SELECT n FROM x");
        let target = parse_one("CREATE VIEW v AS WITH x AS (SELECT 3 AS n), z AS (SELECT 2 AS n) SELECT n FROM x");
        let result = &Comparator::new().compare(&[source], &[target])[0];

        assert_eq!(
            result.differences,
            vec!["Missing CTEs: y", "Extra CTEs: z", "CTE 'x' definition differs"]
        );
        assert_eq!(result.missing_components, vec!["Missing CTE: y"]);
        assert_eq!(result.extra_components, vec!["Extra CTE: z"]);
    }

    #[test]
    fn test_type_mismatch_and_comments() {
        let source = parse_one("-- summary\nCREATE VIEW v AS SELECT a FROM t");
        let target = parse_one("CREATE MATERIALIZED VIEW v AS SELECT a FROM t");
        let result = &Comparator::new().compare(&[source], &[target])[0];

        assert_eq!(
            result.differences,
            vec!["Type mismatch: source=VIEW, docker=MATERIALIZED_VIEW", "Missing comments: 1"]
        );
        assert_eq!(result.kind, ObjectType::View);
    }

    #[test]
    fn test_function_signature_findings() {
        let source = parse_one(
            "CREATE FUNCTION f(a INT, b TEXT) RETURNS NUMERIC(10,2) AS $$ SELECT 1 $$ LANGUAGE sql",
        );
        let target = parse_one("CREATE FUNCTION f(a INT, c DATE) RETURNS NUMERIC AS $$ SELECT 1 $$ LANGUAGE sql");
        let result = &Comparator::new().compare(&[source], &[target])[0];

        assert_eq!(
            result.differences,
            vec![
                "Function parameters differ",
                "Return type differs: source=NUMERIC(10,2), docker=NUMERIC",
            ]
        );
        assert_eq!(result.missing_components, vec!["Missing parameter: b TEXT"]);
        assert_eq!(result.extra_components, vec!["Extra parameter: c DATE"]);
        assert_eq!(result.completeness_pct, 100.0);
    }

    #[test]
    fn test_custom_labels() {
        let comparator = Comparator::with_config(CompareConfig::new().with_labels("repo", "prod"));
        let source = parse_one("CREATE FUNCTION f() RETURNS int AS $$ SELECT 1 $$ LANGUAGE sql");
        let target = parse_one("CREATE FUNCTION f() RETURNS void AS $$ SELECT 1 $$ LANGUAGE sql");
        let result = &comparator.compare(&[source], &[target])[0];

        assert_eq!(result.differences, vec!["Return type differs: repo=int, prod=void"]);
        assert_eq!(result.line_diff[0], "--- repo");
        assert_eq!(result.line_diff[1], "+++ prod");
    }

    #[test]
    fn test_accuracy_ignores_whitespace_layout() {
        let source = parse_one("CREATE VIEW v AS\n    SELECT a,\n           b\n    FROM t");
        let target = parse_one("CREATE VIEW v AS SELECT a, b FROM t");
        let result = &Comparator::new().compare(&[source], &[target])[0];

        assert_eq!(result.status, ComparisonStatus::Match);
        assert_eq!(result.accuracy_pct, 100.0);
        assert!(!result.line_diff.is_empty());
    }

    #[test]
    fn test_comparison_is_repeatable() {
        let reference = read_source_file("tests/sql/reference.sql").unwrap();
        let candidate = read_source_file("tests/sql/candidate.sql").unwrap();
        let comparator = Comparator::new();
        assert_eq!(
            comparator.compare(&reference, &candidate),
            comparator.compare(&reference, &candidate)
        );
    }

    #[test]
    fn test_compare_fixtures() {
        let reference = read_source_file("tests/sql/reference.sql").unwrap();
        let candidate = read_source_file("tests/sql/candidate.sql").unwrap();
        let results = Comparator::new().compare(&reference, &candidate);

        let statuses: Vec<(&str, ComparisonStatus)> = results
            .iter()
            .map(|result| (result.name.as_str(), result.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("claims.claim", ComparisonStatus::Different),
                ("COMMENT ON TABLE claims.claim", ComparisonStatus::Match),
                ("claims.claim_activity", ComparisonStatus::Match),
                ("claims.net_amount", ComparisonStatus::Different),
                ("claims.v_claim_balance", ComparisonStatus::Different),
                ("GRANT SELECT ON TABLE claims.v_claim_balance TO reporting", ComparisonStatus::Match),
                ("claims.mv_payer_totals", ComparisonStatus::Missing),
                ("idx_claim_payer", ComparisonStatus::Match),
                ("GRANT USAGE ON SCHEMA claims TO reporting", ComparisonStatus::Match),
                ("claims.v_open_claims", ComparisonStatus::Extra),
            ]
        );

        assert_eq!(results[0].missing_components, vec!["Missing column: member_id"]);
        assert_eq!(results[0].completeness_pct, 80.0);
        assert_eq!(
            results[3].differences,
            vec!["Return type differs: source=NUMERIC(10,2), docker=NUMERIC"]
        );
        assert_eq!(results[4].differences, vec!["Missing WHERE clause in docker"]);
    }

    #[test]
    fn test_grants_and_comments_do_not_hide_their_target() {
        let reference = parse_source(
            "CREATE TABLE claims.claim (id int, name text);
COMMENT ON TABLE claims.claim IS 'Claims';
CREATE VIEW claims.v AS SELECT id, name FROM claims.claim;
GRANT SELECT ON TABLE claims.v TO reporting;",
        );
        let candidate = parse_source(
            "CREATE TABLE claims.claim (id int);
COMMENT ON TABLE claims.claim IS 'Claims';
CREATE VIEW claims.v AS SELECT id FROM claims.claim;
GRANT SELECT ON TABLE claims.v TO reporting;",
        );
        let results = Comparator::new().compare(&reference, &candidate);

        let statuses: Vec<(&str, ObjectType, ComparisonStatus)> = results
            .iter()
            .map(|result| (result.name.as_str(), result.kind, result.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("claims.claim", ObjectType::Table, ComparisonStatus::Different),
                ("COMMENT ON TABLE claims.claim", ObjectType::Comment, ComparisonStatus::Match),
                ("claims.v", ObjectType::View, ComparisonStatus::Different),
                ("GRANT SELECT ON TABLE claims.v TO reporting", ObjectType::Grant, ComparisonStatus::Match),
            ]
        );
        assert_eq!(results[0].missing_components, vec!["Missing column: name"]);
        assert_eq!(results[2].missing_components, vec!["Missing column: name"]);
    }

    #[test]
    fn test_reindented_clauses_differ_by_default() {
        let source = parse_one("CREATE VIEW v AS SELECT a FROM t WHERE a > 1\n  AND b < 2");
        let target = parse_one("CREATE VIEW v AS SELECT a FROM t WHERE a > 1 AND b < 2");

        let result = &Comparator::new().compare(&[source.clone()], &[target.clone()])[0];
        assert_eq!(result.differences, vec!["WHERE clause differs"]);
        assert_eq!(result.completeness_pct, 50.0);

        let comparator = Comparator::with_config(CompareConfig::new().with_ignore_whitespace(true));
        let result = &comparator.compare(&[source], &[target])[0];
        assert_eq!(result.status, ComparisonStatus::Match);
        assert_eq!(result.completeness_pct, 100.0);
    }

    #[test]
    fn test_ignore_whitespace_covers_ctes_and_parameters() {
        let comparator = Comparator::with_config(CompareConfig::new().with_ignore_whitespace(true));

        let source = parse_one("CREATE VIEW v AS WITH x AS (SELECT a\n    FROM t) SELECT a FROM x JOIN y ON y.a =\n x.a");
        let target = parse_one("CREATE VIEW v AS WITH x AS (SELECT a FROM t) SELECT a FROM x JOIN y ON y.a = x.a");
        let result = &comparator.compare(&[source.clone()], &[target.clone()])[0];
        assert_eq!(result.status, ComparisonStatus::Match);
        assert!(result.missing_components.is_empty());

        let result = &Comparator::new().compare(&[source], &[target])[0];
        assert_eq!(result.differences, vec!["CTE 'x' definition differs"]);
        assert_eq!(result.missing_components.len(), 1);

        let source = parse_one("CREATE FUNCTION f(a   INT) RETURNS int AS $$ SELECT 1 $$ LANGUAGE sql");
        let target = parse_one("CREATE FUNCTION f(a INT) RETURNS int AS $$ SELECT 1 $$ LANGUAGE sql");
        let result = &comparator.compare(&[source], &[target])[0];
        assert_eq!(result.status, ComparisonStatus::Match);
    }

    #[test]
    fn test_accuracy_of_large_unrelated_texts() {
        let source: String = (0..4000).map(|i| if i % 7 == 0 { 'x' } else { 'a' }).collect();
        let target: String = (0..4000).map(|i| if i % 5 == 0 { 'y' } else { 'b' }).collect();

        let score = accuracy(&source, &target);
        assert!((0.0..=100.0).contains(&score));
        assert!(score < 50.0);
        assert_eq!(accuracy(&source, &source), 100.0);
    }

    #[test]
    fn test_line_diff_context() {
        let source = "a\nb\nc\nd\ne\nf\ng";
        let target = "a\nb\nc\nD\ne\nf\ng";

        let narrow = Comparator::with_config(CompareConfig::new().with_diff_context(1));
        let lines = narrow.line_diff(source, target);
        assert_eq!(lines, vec!["--- source", "+++ docker", "@@ -3,3 +3,3 @@", " c", "-d", "+D", " e"]);

        let wide = Comparator::new().line_diff(source, target);
        assert_eq!(wide.len(), 2 + 1 + 6 + 2);
    }
}
