use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::extractor::extract_object;
use crate::schema_object::SchemaObject;
use crate::utils::scanner::SqlScanner;

/// One `;`-terminated statement of a SQL source, without its semicolon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// The statement text, trimmed. Leading comments are kept.
    pub text: String,
    /// 1-based line of the first non-whitespace character.
    pub start_line: usize,
    /// 1-based line of the last non-whitespace character.
    pub end_line: usize,
}

/// Splits SQL source into statements.
///
/// A semicolon ends a statement unless it sits inside a string literal, a quoted identifier, a
/// comment or a dollar-quoted body, so function bodies stay whole. Whitespace-only fragments are
/// skipped; the final statement does not need a semicolon.
///
/// # Examples
///
/// ```
/// use sqldrift::source_code::split_statements;
///
/// let statements = split_statements("CREATE TABLE a (id int);\n\nCREATE TABLE b (id int)");
/// assert_eq!(statements.len(), 2);
/// assert_eq!(statements[1].start_line, 3);
/// ```
pub fn split_statements(content: &str) -> Vec<SqlStatement> {
    let scanner = SqlScanner::new(content);
    let boundaries = scanner
        .code()
        .iter()
        .filter(|c| c.ch == ';')
        .map(|c| c.offset);

    let mut statements = Vec::new();
    let mut start = 0;
    let mut line = 1;
    for end in boundaries.chain(std::iter::once(content.len())) {
        line = push_statement(&mut statements, &content[start..end], line);
        start = (end + 1).min(content.len());
    }
    statements
}

/// Records `fragment` if it holds more than whitespace. Returns the line number following it.
fn push_statement(statements: &mut Vec<SqlStatement>, fragment: &str, line: usize) -> usize {
    let text = fragment.trim();
    if !text.is_empty() {
        let leading = fragment.len() - fragment.trim_start().len();
        let start_line = line + fragment[..leading].matches('\n').count();
        statements.push(SqlStatement {
            text: text.to_string(),
            start_line,
            end_line: start_line + text.matches('\n').count(),
        });
    }
    line + fragment.matches('\n').count()
}

/// Extracts every recognized schema object from SQL source, in source order.
///
/// Statements that are not object definitions (`ALTER`, `INSERT`, `SET`, ...) and definitions
/// whose name cannot be resolved produce nothing. A leading byte order mark is ignored.
pub fn parse_source(content: &str) -> Vec<SchemaObject> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    split_statements(content)
        .iter()
        .filter_map(extract_object)
        .collect()
}

/// Reads one SQL file and extracts its schema objects.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or is not valid UTF-8.
pub fn read_source_file(path: impl AsRef<Path>) -> Result<Vec<SchemaObject>> {
    let path = path.as_ref();
    let io_error = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    log::debug!("Reading SQL objects from {}", path.display());
    let mut file = File::open(path).map_err(io_error)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(io_error)?;

    let objects = parse_source(&contents);
    log::debug!("Found {} SQL objects in {}", objects.len(), path.display());
    Ok(objects)
}

/// Reads several SQL files into one object list, in argument order.
///
/// A file that cannot be read is logged and contributes no objects; the remaining files are
/// still processed.
pub fn read_source_files<P: AsRef<Path>>(paths: &[P]) -> Vec<SchemaObject> {
    let mut objects = Vec::new();
    for path in paths {
        match read_source_file(path) {
            Ok(found) => objects.extend(found),
            Err(e) => log::warn!("{}; skipping", e),
        }
    }
    objects
}
