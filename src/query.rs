//! Query types produced by the predicate builder
//!
//! A [`QueryRequest`] renders two ways:
//! - [`QueryRequest::text`] is the human-readable query with inline literals
//!   (single quotes escaped), shown to the user before running;
//! - [`QueryRequest::to_parameterized`] is what the executor actually runs,
//!   with every value bound as a parameter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sql::sanitize::{quote_identifier, quote_literal, quote_table_ref, render_identifier};

// ============================================================================
// Predicates
// ============================================================================

/// Filter shape for a single column
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateKind {
    /// `col = 'v'`
    Equals(String),
    /// `col IN ('a', 'b')`, never empty
    In(Vec<String>),
    /// `col BETWEEN min AND max`
    Between { min: f64, max: f64 },
}

/// A single column-scoped fragment of a WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub kind: PredicateKind,
}

impl Predicate {
    pub fn new(column: impl Into<String>, kind: PredicateKind) -> Self {
        Self {
            column: column.into(),
            kind,
        }
    }

    /// Render with inline literals
    pub fn to_sql_literal(&self) -> String {
        let column = render_identifier(&self.column);
        match &self.kind {
            PredicateKind::Equals(value) => format!("{} = {}", column, quote_literal(value)),
            PredicateKind::In(values) => {
                let list = values
                    .iter()
                    .map(|v| quote_literal(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} IN ({})", column, list)
            }
            PredicateKind::Between { min, max } => format!(
                "{} BETWEEN {} AND {}",
                column,
                format_number(*min),
                format_number(*max)
            ),
        }
    }

    /// Render with `$n` placeholders, pushing bound values onto `params`
    ///
    /// `param_offset` is the next placeholder number and is advanced past
    /// every placeholder this predicate uses.
    pub fn to_sql_bound(&self, param_offset: &mut i32, params: &mut Vec<serde_json::Value>) -> String {
        let column = quote_identifier(&self.column);
        match &self.kind {
            PredicateKind::Equals(value) => {
                let placeholder = bind(param_offset, params, serde_json::Value::String(value.clone()));
                format!("{}::text = {}", column, placeholder)
            }
            PredicateKind::In(values) => {
                let placeholders = values
                    .iter()
                    .map(|v| bind(param_offset, params, serde_json::Value::String(v.clone())))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}::text IN ({})", column, placeholders)
            }
            PredicateKind::Between { min, max } => {
                let low = bind(param_offset, params, serde_json::Value::from(*min));
                let high = bind(param_offset, params, serde_json::Value::from(*max));
                format!("{} BETWEEN {} AND {}", column, low, high)
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

fn bind(param_offset: &mut i32, params: &mut Vec<serde_json::Value>, value: serde_json::Value) -> String {
    let placeholder = format!("${}", param_offset);
    params.push(value);
    *param_offset += 1;
    placeholder
}

/// Format a numeric bound as plain decimal text (`100`, `2.5`, `-0.25`)
pub fn format_number(value: f64) -> String {
    // f64's Display never uses exponent notation and drops a zero fraction
    format!("{}", value)
}

// ============================================================================
// Projection
// ============================================================================

/// Columns requested by the SELECT clause
///
/// Serializes as `"*"` or as a list of column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// `*`
    #[default]
    All,
    /// Fixed column list, not checked against the table
    Columns(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectionRepr {
    Text(String),
    Columns(Vec<String>),
}

impl Serialize for Projection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Projection::All => serializer.serialize_str("*"),
            Projection::Columns(columns) => columns.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Projection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ProjectionRepr::deserialize(deserializer)? {
            ProjectionRepr::Text(text) => Projection::parse(&text),
            ProjectionRepr::Columns(columns) => Projection::from(columns),
        })
    }
}

impl Projection {
    /// Parse `"*"` or a comma-separated column list
    pub fn parse(projection: &str) -> Self {
        let trimmed = projection.trim();
        if trimmed == "*" || trimmed.is_empty() {
            return Projection::All;
        }
        Projection::Columns(
            trimmed
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }

    fn to_sql_literal(&self) -> String {
        match self {
            Projection::All => "*".to_string(),
            Projection::Columns(columns) => columns
                .iter()
                .map(|c| render_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn to_sql_quoted(&self) -> String {
        match self {
            Projection::All => "*".to_string(),
            Projection::Columns(columns) => columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<&str> for Projection {
    fn from(projection: &str) -> Self {
        Projection::parse(projection)
    }
}

impl From<String> for Projection {
    fn from(projection: String) -> Self {
        Projection::parse(&projection)
    }
}

impl From<Vec<String>> for Projection {
    fn from(columns: Vec<String>) -> Self {
        if columns.is_empty() {
            Projection::All
        } else {
            Projection::Columns(columns)
        }
    }
}

// ============================================================================
// Query Requests
// ============================================================================

/// A finished filter query, ready to display or execute
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub projection: Projection,
    pub table_ref: String,
    pub predicates: Vec<Predicate>,
    pub limit: Option<u64>,
}

/// SQL with positional parameters, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedQuery {
    pub sql: String,
    pub params: Vec<serde_json::Value>,
}

impl QueryRequest {
    pub fn new(table_ref: impl Into<String>, projection: impl Into<Projection>) -> Self {
        Self {
            projection: projection.into(),
            table_ref: table_ref.into(),
            predicates: Vec::new(),
            limit: None,
        }
    }

    pub fn with_predicates(mut self, predicates: Vec<Predicate>) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query text with inline literals
    ///
    /// Always of the form `SELECT <projection> FROM <table> WHERE 1=1`
    /// followed by ` AND <predicate>` for each predicate. The table
    /// reference is printed as given.
    pub fn text(&self) -> String {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE 1=1",
            self.projection.to_sql_literal(),
            self.table_ref
        );

        if !self.predicates.is_empty() {
            let conditions = self
                .predicates
                .iter()
                .map(Predicate::to_sql_literal)
                .collect::<Vec<_>>();
            sql.push_str(" AND ");
            sql.push_str(&conditions.join(" AND "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }

    /// Query with all values bound as `$1, $2, ...` parameters
    pub fn to_parameterized(&self) -> ParameterizedQuery {
        let mut param_offset = 1;
        let mut params = Vec::new();

        let mut sql = format!(
            "SELECT {} FROM {} WHERE 1=1",
            self.projection.to_sql_quoted(),
            quote_table_ref(&self.table_ref)
        );

        for predicate in &self.predicates {
            let clause = predicate.to_sql_bound(&mut param_offset, &mut params);
            sql.push_str(" AND ");
            sql.push_str(&clause);
        }

        if let Some(limit) = self.limit {
            // PostgreSQL takes a bigint here; larger limits mean no limit
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            sql.push_str(&format!(" LIMIT ${}", param_offset));
            params.push(serde_json::Value::from(limit));
        }

        ParameterizedQuery { sql, params }
    }
}

impl fmt::Display for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
