//! Error types for filter building and warehouse access

use thiserror::Error;

use crate::types::TypeClass;

/// Errors that can occur while building or running a filtered query
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid selection kind for column '{column}': {kind} is not supported for {type_class} columns")]
    InvalidSelectionKind {
        column: String,
        type_class: TypeClass,
        kind: &'static str,
    },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Malformed range for column '{column}': min {min} / max {max}")]
    MalformedRange { column: String, min: f64, max: f64 },

    #[error("Empty selection for column: {0}")]
    EmptySelection(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FilterError {
    pub fn invalid_selection_kind(
        column: impl Into<String>,
        type_class: TypeClass,
        kind: &'static str,
    ) -> Self {
        Self::InvalidSelectionKind {
            column: column.into(),
            type_class,
            kind,
        }
    }

    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn(column.into())
    }

    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound(table.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
