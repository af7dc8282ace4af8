//! Structural feature extraction.
//!
//! Each recognized statement becomes one [`SchemaObject`]. Extraction is heuristic and never
//! fails: a missing clause leaves its field empty, and a statement whose name cannot be resolved
//! is dropped entirely. Everything except comment collection works on a comment-stripped copy of
//! the statement so that comments cannot leak into column names or clause texts.
//!
//! Clause texts, join conditions, CTE definitions and parameters keep their original layout and
//! are only trimmed.

use std::sync::LazyLock;

use regex::Regex;

use crate::classifier::{classify, extract_object_name};
use crate::schema_object::{Cte, Join, ObjectType, SchemaObject, SourceSpan};
use crate::source_code::SqlStatement;
use crate::utils::scanner::{match_keyword, strip_comments, SqlScanner};
use crate::utils::{collapse_whitespace, skip_whitespace, unquote, QUALIFIED_NAME};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:"[^"]+"|[\p{L}_][\p{L}\p{N}_$]*)"#).unwrap());
static SOLE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:"[^"]+"|[\p{L}_][\p{L}\p{N}_$]*)$"#).unwrap());
static QUALIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}", QUALIFIED_NAME)).unwrap());
static SOLE_QUALIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}$", QUALIFIED_NAME)).unwrap());
static FUNCTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_$.]*\s*\(").unwrap());
static TRAILING_OPTIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\s+WITH\s+(?:(?:NO\s+)?DATA|(?:(?:LOCAL|CASCADED)\s+)?CHECK\s+OPTION)\s*$",
    )
    .unwrap()
});
static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Join keywords and the join type they are recorded as.
const JOIN_KINDS: [(&str, &str); 9] = [
    ("FULL OUTER JOIN", "FULL OUTER JOIN"),
    ("FULL JOIN", "FULL OUTER JOIN"),
    ("LEFT OUTER JOIN", "LEFT JOIN"),
    ("LEFT JOIN", "LEFT JOIN"),
    ("RIGHT OUTER JOIN", "RIGHT JOIN"),
    ("RIGHT JOIN", "RIGHT JOIN"),
    ("INNER JOIN", "INNER JOIN"),
    ("CROSS JOIN", "CROSS JOIN"),
    ("JOIN", "JOIN"),
];

const CONDITION_STOPS: [&str; 19] = [
    "FULL OUTER JOIN",
    "FULL JOIN",
    "LEFT OUTER JOIN",
    "LEFT JOIN",
    "RIGHT OUTER JOIN",
    "RIGHT JOIN",
    "INNER JOIN",
    "CROSS JOIN",
    "JOIN",
    "WHERE",
    "GROUP BY",
    "HAVING",
    "WINDOW",
    "ORDER BY",
    "LIMIT",
    "OFFSET",
    "UNION",
    "INTERSECT",
    "EXCEPT",
];

const SELECT_LIST_STOPS: [&str; 10] = [
    "FROM",
    "WHERE",
    "GROUP BY",
    "HAVING",
    "WINDOW",
    "ORDER BY",
    "LIMIT",
    "UNION",
    "INTERSECT",
    "EXCEPT",
];
const WHERE_STOPS: [&str; 10] = [
    "GROUP BY",
    "HAVING",
    "WINDOW",
    "ORDER BY",
    "LIMIT",
    "OFFSET",
    "FETCH",
    "UNION",
    "INTERSECT",
    "EXCEPT",
];
const GROUP_BY_STOPS: [&str; 9] = [
    "HAVING",
    "WINDOW",
    "ORDER BY",
    "LIMIT",
    "OFFSET",
    "FETCH",
    "UNION",
    "INTERSECT",
    "EXCEPT",
];
const ORDER_BY_STOPS: [&str; 6] = ["LIMIT", "OFFSET", "FETCH", "UNION", "INTERSECT", "EXCEPT"];

/// Entries of a table body that are constraints rather than columns.
const TABLE_CONSTRAINTS: [&str; 7] = [
    "PRIMARY KEY",
    "FOREIGN KEY",
    "UNIQUE",
    "CHECK",
    "CONSTRAINT",
    "EXCLUDE",
    "LIKE",
];

/// Words after the first one of multi-word type names.
const TYPE_CONTINUATIONS: [&str; 4] = ["PRECISION", "VARYING", "WITH TIME ZONE", "WITHOUT TIME ZONE"];

/// Trailing words that end an expression rather than alias it.
const NON_ALIAS_WORDS: [&str; 24] = [
    "END", "NULL", "TRUE", "FALSE", "ASC", "DESC", "AND", "OR", "NOT", "IS", "IN", "LIKE",
    "ILIKE", "BETWEEN", "THEN", "ELSE", "WHEN", "CASE", "ZONE", "PRECISION", "VARYING", "ALL",
    "ANY", "SOME",
];

/// Words that expect an operand after them.
const OPERAND_KEYWORDS: [&str; 18] = [
    "CASE", "WHEN", "THEN", "ELSE", "AND", "OR", "NOT", "IS", "IN", "LIKE", "ILIKE", "BETWEEN",
    "DISTINCT", "INTERVAL", "AT", "TIME", "WITH", "WITHOUT",
];

/// Words that can follow a joined table but are not its alias.
const NON_TABLE_ALIASES: [&str; 20] = [
    "ON", "USING", "WHERE", "JOIN", "LEFT", "RIGHT", "INNER", "FULL", "CROSS", "NATURAL",
    "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "UNION", "INTERSECT", "EXCEPT", "WINDOW",
    "LATERAL",
];

/// Builds the structural model of one statement, or `None` when the statement is not an object
/// definition or its name cannot be resolved.
pub fn extract_object(statement: &SqlStatement) -> Option<SchemaObject> {
    let stripped = strip_comments(&statement.text);
    let clean = stripped.trim();

    let Some(kind) = classify(clean) else {
        log::debug!(
            "Ignoring statement at line {}: not an object definition",
            statement.start_line
        );
        return None;
    };
    let Some((name, name_end)) = extract_object_name(clean, kind) else {
        log::debug!(
            "Dropping {} statement at line {}: no resolvable name",
            kind,
            statement.start_line
        );
        return None;
    };

    let span = SourceSpan {
        start_line: statement.start_line,
        end_line: statement.end_line,
    };
    let mut object = SchemaObject::new(name, kind, statement.text.clone(), span);
    object.comments = extract_comments(&statement.text);

    let rest = &clean[name_end..];
    match kind {
        ObjectType::View | ObjectType::MaterializedView => extract_query_features(&mut object, rest),
        ObjectType::Function => extract_function_features(&mut object, rest),
        ObjectType::Table => object.columns = extract_table_columns(rest),
        ObjectType::Index | ObjectType::Trigger | ObjectType::Grant | ObjectType::Comment => {}
    }
    Some(object)
}

/// Collects `--` comment lines and `/* */` blocks in source order.
pub fn extract_comments(text: &str) -> Vec<String> {
    let blocks: Vec<(usize, usize)> = BLOCK_COMMENT
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    let mut found: Vec<(usize, String)> = blocks
        .iter()
        .map(|&(start, end)| (start, text[start..end].to_string()))
        .collect();

    let mut offset = 0;
    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            let start = offset + (line.len() - line.trim_start().len());
            if !blocks.iter().any(|&(s, e)| start >= s && start < e) {
                found.push((start, trimmed.to_string()));
            }
        }
        offset += line.len() + 1;
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, comment)| comment).collect()
}

fn extract_query_features(object: &mut SchemaObject, after_name: &str) {
    let Some((_, as_end)) = SqlScanner::new(after_name).find_keyword("AS", 0) else {
        return;
    };
    let body = after_name[as_end..].trim();
    let body = TRAILING_OPTIONS.find(body).map_or(body, |m| &body[..m.start()]);

    let scanner = SqlScanner::new(body);
    let (ctes, main_start) = extract_ctes(&scanner);
    object.ctes = ctes;
    object.joins = extract_joins(&scanner);

    let main = SqlScanner::new(&body[main_start..]);
    object.columns = extract_select_columns(&main);
    object.where_clause = extract_clause(&main, "WHERE", &WHERE_STOPS);
    object.group_by = extract_clause(&main, "GROUP BY", &GROUP_BY_STOPS);
    object.order_by = extract_clause(&main, "ORDER BY", &ORDER_BY_STOPS);
}

/// Parses a leading `WITH` list. Returns the CTEs and the offset where the main query starts.
fn extract_ctes(scanner: &SqlScanner) -> (Vec<Cte>, usize) {
    let body = scanner.text();
    let Some(with_end) = match_keyword(body, 0, "WITH") else {
        return (Vec::new(), 0);
    };
    let mut pos = skip_whitespace(body, with_end);
    if let Some(end) = match_keyword(body, pos, "RECURSIVE") {
        pos = skip_whitespace(body, end);
    }

    let mut ctes = Vec::new();
    while let Some(name) = IDENTIFIER.find(&body[pos..]) {
        let cte_name = unquote(name.as_str()).to_string();
        pos = skip_whitespace(body, pos + name.end());

        // optional column list
        if body[pos..].starts_with('(') {
            let Some(close) = scanner.matching_paren(pos) else {
                break;
            };
            pos = skip_whitespace(body, close + 1);
        }
        let Some(as_end) = match_keyword(body, pos, "AS") else {
            break;
        };
        pos = skip_whitespace(body, as_end);
        for modifier in ["NOT MATERIALIZED", "MATERIALIZED"] {
            if let Some(end) = match_keyword(body, pos, modifier) {
                pos = skip_whitespace(body, end);
                break;
            }
        }

        if !body[pos..].starts_with('(') {
            break;
        }
        let Some(close) = scanner.matching_paren(pos) else {
            break;
        };
        ctes.push(Cte {
            name: cte_name,
            definition: body[pos + 1..close].trim().to_string(),
        });

        pos = skip_whitespace(body, close + 1);
        if !body[pos..].starts_with(',') {
            break;
        }
        pos = skip_whitespace(body, pos + 1);
    }
    (ctes, pos)
}

/// Output column names of the first depth-0 SELECT list.
fn extract_select_columns(scanner: &SqlScanner) -> Vec<String> {
    let text = scanner.text();
    let Some((_, select_end)) = scanner.find_keyword("SELECT", 0) else {
        return Vec::new();
    };
    let list_end = scanner.clause_end(select_end, 0, &SELECT_LIST_STOPS);
    SqlScanner::new(&text[select_end..list_end])
        .split_top_level(',')
        .into_iter()
        .filter_map(output_column_name)
        .collect()
}

fn output_column_name(item: &str) -> Option<String> {
    let item = strip_distinct(item);
    if item.is_empty() || item == "*" || item.ends_with(".*") {
        return None;
    }

    let scanner = SqlScanner::new(item);
    if let Some((_, as_end)) = scanner.find_last_keyword("AS") {
        let alias = item[as_end..].trim();
        if !alias.is_empty() {
            return Some(unquote(alias).to_string());
        }
    }
    if let Some(alias) = implicit_alias(&scanner) {
        return Some(alias);
    }

    let expression = base_expression(item);
    if SOLE_QUALIFIED.is_match(expression) {
        let last = expression.rsplit('.').next().unwrap_or(expression);
        return Some(unquote(last).to_string());
    }
    Some(collapse_whitespace(expression))
}

/// `expr alias` without `AS`.
fn implicit_alias(scanner: &SqlScanner) -> Option<String> {
    let item = scanner.text();
    let split = scanner.last_top_level_whitespace()?;
    let alias = item[split..].trim();
    let expression = item[..split].trim_end();
    if expression.is_empty() || !SOLE_IDENTIFIER.is_match(alias) {
        return None;
    }
    if NON_ALIAS_WORDS.contains(&alias.to_ascii_uppercase().as_str()) {
        return None;
    }
    if expression.ends_with(|c: char| "+-*/%|=<>!~^&:,(".contains(c)) {
        return None;
    }
    let previous = expression
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if OPERAND_KEYWORDS.contains(&previous.as_str()) {
        return None;
    }
    Some(unquote(alias).to_string())
}

/// Peels casts and function wrappers off an expression: `max(t.amount)::numeric` → `t.amount`.
/// Calls without a column argument, like `count(*)`, are named after the function.
fn base_expression(expression: &str) -> &str {
    let mut expression = expression.trim();
    loop {
        let scanner = SqlScanner::new(expression);
        let cast = scanner
            .code()
            .iter()
            .find(|c| c.depth == 0 && c.ch == ':' && expression[c.offset..].starts_with("::"));
        if let Some(cast) = cast {
            expression = expression[..cast.offset].trim();
            continue;
        }

        let Some(call) = FUNCTION_CALL.find(expression) else {
            return expression;
        };
        let open = call.end() - 1;
        if scanner.matching_paren(open) != Some(expression.len() - 1) {
            return expression;
        }
        let inner = &expression[open + 1..expression.len() - 1];
        let first = SqlScanner::new(inner)
            .split_top_level(',')
            .into_iter()
            .next()
            .unwrap_or_default();
        // CAST(x AS type)
        let first = match SqlScanner::new(first).find_keyword("AS", 0) {
            Some((start, _)) => first[..start].trim(),
            None => first,
        };
        let first = strip_distinct(first);
        if first.is_empty() || first == "*" {
            return expression[..open].trim();
        }
        expression = first;
    }
}

fn strip_distinct(item: &str) -> &str {
    let item = item.trim();
    if let Some(end) = match_keyword(item, 0, "DISTINCT ON") {
        let open = skip_whitespace(item, end);
        if item[open..].starts_with('(') {
            if let Some(close) = SqlScanner::new(item).matching_paren(open) {
                return item[close + 1..].trim();
            }
        }
        return item[end..].trim();
    }
    match_keyword(item, 0, "DISTINCT").map_or(item, |end| item[end..].trim())
}

/// Every join in the view body, CTE bodies and subqueries included.
fn extract_joins(scanner: &SqlScanner) -> Vec<Join> {
    let text = scanner.text();
    let mut joins = Vec::new();
    let mut resume = 0;

    for c in scanner.code() {
        if c.offset < resume || !c.ch.is_ascii_alphabetic() {
            continue;
        }
        let Some((keyword_end, join_type)) = JOIN_KINDS.iter().find_map(|(keyword, join_type)| {
            match_keyword(text, c.offset, keyword).map(|end| (end, *join_type))
        }) else {
            continue;
        };
        resume = keyword_end;
        if let Some((join, end)) = parse_join(scanner, keyword_end, c.depth, join_type) {
            resume = end;
            joins.push(join);
        }
    }
    joins
}

fn parse_join(
    scanner: &SqlScanner,
    keyword_end: usize,
    depth: i32,
    join_type: &str,
) -> Option<(Join, usize)> {
    let text = scanner.text();
    let mut pos = skip_whitespace(text, keyword_end);
    if let Some(end) = match_keyword(text, pos, "LATERAL") {
        pos = skip_whitespace(text, end);
    }

    let table = if text[pos..].starts_with('(') {
        // a derived table is known by its alias
        let close = scanner.matching_paren(pos)?;
        let (alias, end) = read_alias(text, close + 1)?;
        pos = end;
        alias
    } else {
        let name = QUALIFIED.find(&text[pos..])?;
        pos += name.end();
        if let Some((_, end)) = read_alias(text, pos) {
            pos = end;
        }
        name.as_str().to_string()
    };

    let mut condition = None;
    if let Some(on_end) = match_keyword(text, skip_whitespace(text, pos), "ON") {
        let end = scanner.clause_end(on_end, depth, &CONDITION_STOPS);
        condition = Some(text[on_end..end].trim().to_string()).filter(|c| !c.is_empty());
        pos = end;
    }

    Some((
        Join {
            join_type: join_type.to_string(),
            table,
            condition,
        },
        pos,
    ))
}

fn read_alias(text: &str, pos: usize) -> Option<(String, usize)> {
    let mut pos = skip_whitespace(text, pos);
    if let Some(end) = match_keyword(text, pos, "AS") {
        pos = skip_whitespace(text, end);
    }
    let alias = IDENTIFIER.find(&text[pos..])?;
    if NON_TABLE_ALIASES.contains(&alias.as_str().to_ascii_uppercase().as_str()) {
        return None;
    }
    Some((unquote(alias.as_str()).to_string(), pos + alias.end()))
}

fn extract_clause(scanner: &SqlScanner, keyword: &str, stops: &[&str]) -> Option<String> {
    let (_, start) = scanner.find_keyword(keyword, 0)?;
    let end = scanner.clause_end(start, 0, stops);
    let clause = scanner.text()[start..end].trim().to_string();
    (!clause.is_empty()).then_some(clause)
}

fn extract_function_features(object: &mut SchemaObject, after_name: &str) {
    let scanner = SqlScanner::new(after_name);
    let open = skip_whitespace(after_name, 0);
    let mut returns_from = 0;

    if after_name[open..].starts_with('(') {
        if let Some(close) = scanner.matching_paren(open) {
            object.parameters = SqlScanner::new(&after_name[open + 1..close])
                .split_top_level(',')
                .into_iter()
                .map(|parameter| parameter.trim().to_string())
                .collect();
            returns_from = close + 1;
        }
    }

    if let Some((_, returns_end)) = scanner.find_keyword("RETURNS", returns_from) {
        object.return_type = read_return_type(&scanner, returns_end);
    }
}

/// Reads a type name such as `SETOF claims.claim`, `double precision`, `NUMERIC(10,2)` or
/// `TABLE(id int, total numeric(10,2))`.
fn read_return_type(scanner: &SqlScanner, pos: usize) -> Option<String> {
    let text = scanner.text();
    let start = skip_whitespace(text, pos);
    let mut end = start;
    if let Some(setof_end) = match_keyword(text, end, "SETOF") {
        end = skip_whitespace(text, setof_end);
    }

    let name = QUALIFIED.find(&text[end..])?;
    end += name.end();
    while let Some(word_end) = TYPE_CONTINUATIONS
        .iter()
        .find_map(|word| match_keyword(text, skip_whitespace(text, end), word))
    {
        end = word_end;
    }

    let next = skip_whitespace(text, end);
    if text[next..].starts_with('(') {
        if let Some(close) = scanner.matching_paren(next) {
            end = close + 1;
        }
    }
    if text[end..].starts_with("[]") {
        end += 2;
    }
    Some(collapse_whitespace(&text[start..end]))
}

fn extract_table_columns(after_name: &str) -> Vec<String> {
    let open = skip_whitespace(after_name, 0);
    if !after_name[open..].starts_with('(') {
        return Vec::new();
    }
    let close = SqlScanner::new(after_name)
        .matching_paren(open)
        .unwrap_or(after_name.len());

    SqlScanner::new(&after_name[open + 1..close])
        .split_top_level(',')
        .into_iter()
        .filter(|entry| {
            !TABLE_CONSTRAINTS
                .iter()
                .any(|keyword| match_keyword(entry, 0, keyword).is_some())
        })
        .filter_map(|entry| entry.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
