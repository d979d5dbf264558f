//! Identifier and literal quoting
//!
//! Identifiers coming from the warehouse catalog are printed bare when they
//! are plain words and double-quoted otherwise. String literals always have
//! embedded single quotes doubled.

use std::sync::LazyLock;

use regex::Regex;

/// Keywords that cannot be used as bare identifiers
pub const RESERVED_WORDS: &[&str] = &[
    "ALL", "ANALYSE", "ANALYZE", "AND", "ANY", "ARRAY", "AS", "ASC", "ASYMMETRIC", "BETWEEN",
    "BOTH", "BY", "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT", "DESC",
    "DISTINCT", "DO", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN",
    "FROM", "FULL", "GRANT", "GROUP", "HAVING", "IN", "INNER", "INTERSECT", "INTERVAL", "INTO",
    "IS", "JOIN", "LATERAL", "LEADING", "LEFT", "LIKE", "LIMIT", "NATURAL", "NOT", "NULL",
    "OFFSET", "ON", "ONLY", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES", "RETURNING",
    "RIGHT", "SELECT", "SESSION_USER", "SOME", "SYMMETRIC", "TABLE", "THEN", "TO", "TRAILING",
    "TRUE", "UNION", "UNIQUE", "USER", "USING", "VARIADIC", "WHEN", "WHERE", "WINDOW", "WITH",
];

static BARE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern is valid")
});

/// Quote a SQL identifier, doubling any embedded double quotes
///
/// # Example
/// ```
/// use warehouse_filter::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("age_group"), "\"age_group\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Quote a dotted table reference part by part (`schema.table`)
pub fn quote_table_ref(table_ref: &str) -> String {
    table_ref
        .split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a string literal, doubling any embedded single quotes
///
/// # Example
/// ```
/// use warehouse_filter::sql::quote_literal;
///
/// assert_eq!(quote_literal("18-24"), "'18-24'");
/// assert_eq!(quote_literal("it's"), "'it''s'");
/// ```
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Whether a name can be printed without quotes
pub fn is_bare_identifier(name: &str) -> bool {
    BARE_IDENTIFIER.is_match(name) && !RESERVED_WORDS.contains(&name.to_uppercase().as_str())
}

/// Render an identifier for display text: bare when safe, quoted otherwise
pub fn render_identifier(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        quote_identifier(name)
    }
}

/// Validate a schema or column name supplied through configuration
///
/// Rules:
/// - Must start with a letter or underscore
/// - Can only contain letters, numbers, and underscores
/// - Cannot be a reserved word
///
/// # Example
/// ```
/// use warehouse_filter::sql::validate_identifier;
///
/// assert!(validate_identifier("analytics").is_ok());
/// assert!(validate_identifier("select").is_err());
/// assert!(validate_identifier("my-schema").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if !BARE_IDENTIFIER.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a letter or underscore and contain only letters, numbers, and underscores.",
            name
        ));
    }

    if RESERVED_WORDS.contains(&name.to_uppercase().as_str()) {
        return Err(format!(
            "Identifier '{}' is a reserved keyword and cannot be used.",
            name
        ));
    }

    Ok(())
}
