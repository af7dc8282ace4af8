//! Statement classification and object name resolution.
//!
//! Classification is an ordered table of anchored, case-insensitive prefix patterns. Order
//! matters: `CREATE OR REPLACE VIEW` and `CREATE MATERIALIZED VIEW` are checked before the plain
//! `CREATE VIEW` form.

use std::sync::LazyLock;

use regex::Regex;

use crate::schema_object::ObjectType;
use crate::utils::scanner::literal_len;
use crate::utils::{collapse_whitespace, QUALIFIED_NAME};

static CLASSIFIERS: LazyLock<Vec<(Regex, ObjectType)>> = LazyLock::new(|| {
    [
        (
            r"^CREATE\s+OR\s+REPLACE\s+(?:TEMP(?:ORARY)?\s+)?(?:RECURSIVE\s+)?VIEW\b",
            ObjectType::View,
        ),
        (r"^CREATE\s+MATERIALIZED\s+VIEW\b", ObjectType::MaterializedView),
        (
            r"^CREATE\s+OR\s+REPLACE\s+(?:FUNCTION|PROCEDURE)\b",
            ObjectType::Function,
        ),
        (
            r"^CREATE\s+(?:TEMP(?:ORARY)?\s+)?(?:RECURSIVE\s+)?VIEW\b",
            ObjectType::View,
        ),
        (r"^CREATE\s+(?:FUNCTION|PROCEDURE)\b", ObjectType::Function),
        (
            r"^CREATE\s+(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\b",
            ObjectType::Table,
        ),
        (r"^CREATE\s+(?:UNIQUE\s+)?INDEX\b", ObjectType::Index),
        (
            r"^CREATE\s+(?:OR\s+REPLACE\s+)?(?:CONSTRAINT\s+)?TRIGGER\b",
            ObjectType::Trigger,
        ),
        (r"^GRANT\b", ObjectType::Grant),
        (r"^COMMENT\s+ON\b", ObjectType::Comment),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(&format!("(?i){}", pattern)).unwrap(), kind))
    .collect()
});

fn name_regex(prefix: &str) -> Regex {
    Regex::new(&format!(r"(?is){}(?P<name>{})", prefix, QUALIFIED_NAME)).unwrap()
}

static VIEW_NAME: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(r"^CREATE\s+(?:OR\s+REPLACE\s+)?(?:TEMP(?:ORARY)?\s+)?(?:RECURSIVE\s+)?VIEW\s+")
});
static MATERIALIZED_VIEW_NAME: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(r"^CREATE\s+MATERIALIZED\s+VIEW\s+(?:IF\s+NOT\s+EXISTS\s+)?")
});
static FUNCTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(r"^CREATE\s+(?:OR\s+REPLACE\s+)?(?:FUNCTION|PROCEDURE)\s+")
});
static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(
        r"^CREATE\s+(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?",
    )
});
static INDEX_NAME: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(r"^CREATE\s+(?:UNIQUE\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?")
});
static TRIGGER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(r"^CREATE\s+(?:OR\s+REPLACE\s+)?(?:CONSTRAINT\s+)?TRIGGER\s+")
});
static GRANT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(
        r"^GRANT\s+(?P<privileges>.*?)\s+ON\s+(?P<class>(?:TABLE|SEQUENCE|FUNCTION|PROCEDURE|SCHEMA|DATABASE|TYPE|DOMAIN)\s+|ALL\s+(?:TABLES|SEQUENCES|FUNCTIONS|PROCEDURES)\s+IN\s+SCHEMA\s+)?",
    )
});
static GRANTEES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bTO\s+(?P<grantees>.+?)(?:\s+WITH\s+GRANT\s+OPTION\b|\s+GRANTED\s+BY\b|\s*$)")
        .unwrap()
});
static COMMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(
        r"^COMMENT\s+ON\s+(?P<class>(?:MATERIALIZED\s+VIEW|COLUMN|TABLE|VIEW|FUNCTION|PROCEDURE|INDEX|TRIGGER|SCHEMA|SEQUENCE|TYPE|DOMAIN|CONSTRAINT|DATABASE|EXTENSION|ROLE)\s+)?",
    )
});

/// Skips whitespace and any comments in front of the first keyword.
pub fn strip_leading_comments(statement: &str) -> &str {
    let mut rest = statement.trim_start();
    while rest.starts_with("--") || rest.starts_with("/*") {
        let len = literal_len(rest).unwrap_or(rest.len());
        rest = rest[len..].trim_start();
    }
    rest
}

/// Returns the object type a statement defines, or `None` for statements that are not
/// modelled (`ALTER`, `INSERT`, `SET`, transaction control, ...).
pub fn classify(statement: &str) -> Option<ObjectType> {
    let head = strip_leading_comments(statement);
    CLASSIFIERS
        .iter()
        .find(|(pattern, _)| pattern.is_match(head))
        .map(|(_, kind)| *kind)
}

/// Resolves the object name of a classified statement.
///
/// `statement` must start at its first keyword. Returns the name and the byte offset right
/// after the defined identifier, where type-specific extraction continues.
///
/// Grants and comments are named by their statement identity (`GRANT SELECT ON TABLE claims.v TO
/// reporting`, `COMMENT ON TABLE claims.claim`) and never share a name with their target.
pub fn extract_object_name(statement: &str, kind: ObjectType) -> Option<(String, usize)> {
    let pattern: &Regex = match kind {
        ObjectType::View => &VIEW_NAME,
        ObjectType::MaterializedView => &MATERIALIZED_VIEW_NAME,
        ObjectType::Function => &FUNCTION_NAME,
        ObjectType::Table => &TABLE_NAME,
        ObjectType::Index => &INDEX_NAME,
        ObjectType::Trigger => &TRIGGER_NAME,
        ObjectType::Grant => &GRANT_NAME,
        ObjectType::Comment => &COMMENT_NAME,
    };
    let captures = pattern.captures(statement)?;
    let target = captures.name("name")?;

    // An unnamed index (`CREATE INDEX ON t (...)`) would otherwise be called "ON".
    if kind == ObjectType::Index && target.as_str().eq_ignore_ascii_case("on") {
        return None;
    }

    let class = captures
        .name("class")
        .map(|class| format!("{} ", collapse_whitespace(class.as_str()).to_ascii_uppercase()))
        .unwrap_or_default();
    let name = match kind {
        ObjectType::Grant => {
            let privileges = captures.name("privileges").map_or("", |m| m.as_str());
            let mut name = format!(
                "GRANT {} ON {}{}",
                collapse_whitespace(privileges).to_ascii_uppercase(),
                class,
                target.as_str()
            );
            if let Some(grantees) = GRANTEES
                .captures(&statement[target.end()..])
                .and_then(|found| found.name("grantees"))
            {
                name.push_str(" TO ");
                name.push_str(&collapse_whitespace(grantees.as_str()));
            }
            name
        }
        ObjectType::Comment => format!("COMMENT ON {}{}", class, target.as_str()),
        _ => target.as_str().to_string(),
    };
    Some((name, target.end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_object_statements() {
        let cases = [
            ("CREATE OR REPLACE VIEW v AS SELECT 1", ObjectType::View),
            ("create view v as select 1", ObjectType::View),
            ("CREATE MATERIALIZED VIEW mv AS SELECT 1", ObjectType::MaterializedView),
            ("CREATE OR REPLACE FUNCTION f() RETURNS int", ObjectType::Function),
            ("CREATE PROCEDURE p() LANGUAGE sql", ObjectType::Function),
            ("CREATE TABLE t (id int)", ObjectType::Table),
            ("CREATE UNLOGGED TABLE t (id int)", ObjectType::Table),
            ("CREATE UNIQUE INDEX i ON t (id)", ObjectType::Index),
            ("CREATE INDEX i ON t (id)", ObjectType::Index),
            ("CREATE TRIGGER trg AFTER INSERT ON t", ObjectType::Trigger),
            ("GRANT SELECT ON t TO r", ObjectType::Grant),
            ("COMMENT ON TABLE t IS 'x'", ObjectType::Comment),
        ];
        for (statement, expected) in cases {
            assert_eq!(classify(statement), Some(expected), "{}", statement);
        }
    }

    #[test]
    fn test_classify_ignores_other_statements() {
        for statement in [
            "ANALYZE t",
            "ALTER TABLE t ADD COLUMN x int",
            "INSERT INTO t VALUES (1)",
            "SET search_path = claims",
            "BEGIN",
            "COMMIT",
            "-- only a comment",
        ] {
            assert_eq!(classify(statement), None, "{}", statement);
        }
    }

    #[test]
    fn test_classify_skips_leading_comments() {
        let statement = "-- Claims summary\n/* owner: reporting */\nCREATE OR REPLACE VIEW v AS SELECT 1";
        assert_eq!(classify(statement), Some(ObjectType::View));
    }

    #[test]
    fn test_extract_object_name() {
        let cases = [
            ("CREATE OR REPLACE VIEW claims.v_summary AS SELECT 1", ObjectType::View, "claims.v_summary"),
            ("CREATE MATERIALIZED VIEW IF NOT EXISTS mv_x AS SELECT 1", ObjectType::MaterializedView, "mv_x"),
            ("CREATE TABLE IF NOT EXISTS claims.claim (id int)", ObjectType::Table, "claims.claim"),
            ("CREATE UNIQUE INDEX CONCURRENTLY idx_a ON t (a)", ObjectType::Index, "idx_a"),
            ("COMMENT ON COLUMN claims.claim.id IS 'pk'", ObjectType::Comment, "COMMENT ON COLUMN claims.claim.id"),
            ("CREATE TABLE \"Claims\".\"Remit\" (id int)", ObjectType::Table, "\"Claims\".\"Remit\""),
        ];
        for (statement, kind, expected) in cases {
            let (name, _) = extract_object_name(statement, kind).unwrap();
            assert_eq!(name, expected, "{}", statement);
        }
    }

    #[test]
    fn test_name_end_offset() {
        let statement = "CREATE FUNCTION claims.f(a int) RETURNS int";
        let (name, end) = extract_object_name(statement, ObjectType::Function).unwrap();
        assert_eq!(name, "claims.f");
        assert_eq!(&statement[end..end + 1], "(");
    }

    #[test]
    fn test_unresolvable_names() {
        assert_eq!(extract_object_name("CREATE INDEX ON t (a)", ObjectType::Index), None);
        assert_eq!(extract_object_name("GRANT admin TO bob", ObjectType::Grant), None);
        assert_eq!(extract_object_name("CREATE TABLE (id int)", ObjectType::Table), None);
    }

    #[test]
    fn test_grant_and_comment_identities() {
        let cases = [
            (
                "GRANT select, insert ON TABLE claims.claim TO app",
                ObjectType::Grant,
                "GRANT SELECT, INSERT ON TABLE claims.claim TO app",
            ),
            ("GRANT USAGE ON SCHEMA claims TO app", ObjectType::Grant, "GRANT USAGE ON SCHEMA claims TO app"),
            (
                "GRANT SELECT ON ALL TABLES IN SCHEMA claims TO app, reporting WITH GRANT OPTION",
                ObjectType::Grant,
                "GRANT SELECT ON ALL TABLES IN SCHEMA claims TO app, reporting",
            ),
            (
                "GRANT EXECUTE ON FUNCTION claims.net_amount(bigint) TO app",
                ObjectType::Grant,
                "GRANT EXECUTE ON FUNCTION claims.net_amount TO app",
            ),
            ("GRANT SELECT ON claims.v TO reporting", ObjectType::Grant, "GRANT SELECT ON claims.v TO reporting"),
            ("COMMENT ON TABLE claims.claim IS 'Claims'", ObjectType::Comment, "COMMENT ON TABLE claims.claim"),
            (
                "COMMENT ON materialized  view claims.mv IS 'Totals'",
                ObjectType::Comment,
                "COMMENT ON MATERIALIZED VIEW claims.mv",
            ),
        ];
        for (statement, kind, expected) in cases {
            let (name, _) = extract_object_name(statement, kind).unwrap();
            assert_eq!(name, expected, "{}", statement);
        }
    }

    #[test]
    fn test_grant_and_comment_names_differ_from_their_target() {
        let (table, _) = extract_object_name("CREATE TABLE claims.claim (id int)", ObjectType::Table).unwrap();
        let (comment, _) =
            extract_object_name("COMMENT ON TABLE claims.claim IS 'Claims'", ObjectType::Comment).unwrap();
        let (grant, _) =
            extract_object_name("GRANT SELECT ON TABLE claims.claim TO reporting", ObjectType::Grant).unwrap();
        assert_ne!(comment, table);
        assert_ne!(grant, table);
    }

    #[test]
    fn test_unicode_names() {
        let (name, _) = extract_object_name("CREATE VIEW é AS SELECT 1", ObjectType::View).unwrap();
        assert_eq!(name, "é");
        let (name, _) =
            extract_object_name("CREATE TABLE données.réclamation (id int)", ObjectType::Table).unwrap();
        assert_eq!(name, "données.réclamation");
    }
}
