use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of schema objects recognized in SQL source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    View,
    MaterializedView,
    Function,
    Table,
    Index,
    Trigger,
    Grant,
    Comment,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::View => "VIEW",
            ObjectType::MaterializedView => "MATERIALIZED_VIEW",
            ObjectType::Function => "FUNCTION",
            ObjectType::Table => "TABLE",
            ObjectType::Index => "INDEX",
            ObjectType::Trigger => "TRIGGER",
            ObjectType::Grant => "GRANT",
            ObjectType::Comment => "COMMENT",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line range of a statement in its source file, 1-based and inclusive.
///
/// Computed from newline counts while segmenting, so it is approximate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
}

/// A named subquery from a `WITH` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    pub definition: String,
}

/// A join found in a view body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub join_type: String,
    pub table: String,
    /// The `ON` predicate, absent for joins without one.
    pub condition: Option<String>,
}

impl Join {
    /// Comparison key that ignores the join condition.
    pub fn key(&self) -> (&str, &str) {
        (&self.join_type, &self.table)
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.join_type, self.table)?;
        if let Some(condition) = &self.condition {
            write!(f, " ON {}", condition)?;
        }
        Ok(())
    }
}

/// Structural model of one recognized SQL statement.
///
/// Collection fields are always present, possibly empty, so comparison code never has to
/// distinguish "absent" from "none found".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaObject {
    /// The qualified name of the object.
    pub name: String,
    pub kind: ObjectType,
    /// The statement exactly as written, without its terminating semicolon.
    pub raw_text: String,
    pub source_span: SourceSpan,
    /// `--` lines and `/* */` blocks in source order.
    pub comments: Vec<String>,
    /// SELECT-list output names for views, declared columns for tables.
    pub columns: Vec<String>,
    pub ctes: Vec<Cte>,
    pub joins: Vec<Join>,
    pub where_clause: Option<String>,
    pub group_by: Option<String>,
    pub order_by: Option<String>,
    /// Raw parameter declarations, functions only.
    pub parameters: Vec<String>,
    /// Declared return type, functions only.
    pub return_type: Option<String>,
}

impl SchemaObject {
    /// Creates an object carrying identity only; structural fields start empty.
    pub fn new(
        name: impl Into<String>,
        kind: ObjectType,
        raw_text: impl Into<String>,
        source_span: SourceSpan,
    ) -> Self {
        SchemaObject {
            name: name.into(),
            kind,
            raw_text: raw_text.into(),
            source_span,
            comments: Vec::new(),
            columns: Vec::new(),
            ctes: Vec::new(),
            joins: Vec::new(),
            where_clause: None,
            group_by: None,
            order_by: None,
            parameters: Vec::new(),
            return_type: None,
        }
    }
}
