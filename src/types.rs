//! Core type definitions for warehouse tables
//!
//! Includes type classes and column descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Classes
// ============================================================================

/// Coarse type class of a warehouse column, used to pick a predicate shape
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TypeClass {
    /// Integer, floating point and fixed-point columns (filtered by range)
    Numeric,
    /// Text-like and boolean columns (filtered by value membership)
    Categorical,
    /// Anything else (dates, timestamps, JSON, arrays, ...)
    Other,
}

const NUMERIC_TYPES: &[&str] = &[
    "smallint",
    "integer",
    "int",
    "bigint",
    "int2",
    "int4",
    "int8",
    "int64",
    "smallserial",
    "serial",
    "bigserial",
    "real",
    "double precision",
    "float",
    "float4",
    "float8",
    "float64",
    "numeric",
    "decimal",
    "bignumeric",
];

const CATEGORICAL_TYPES: &[&str] = &[
    "text",
    "character varying",
    "varchar",
    "character",
    "char",
    "bpchar",
    "name",
    "string",
    "citext",
    "boolean",
    "bool",
];

impl TypeClass {
    /// Classify a declared SQL type name such as `bigint`, `NUMERIC(10,2)` or
    /// `character varying`
    pub fn from_sql_type(sql_type: &str) -> Self {
        let normalized = sql_type.trim().to_lowercase();
        // Strip precision/length suffix: numeric(10,2) -> numeric
        let base = match normalized.find('(') {
            Some(idx) => normalized[..idx].trim_end(),
            None => normalized.as_str(),
        };

        if NUMERIC_TYPES.contains(&base) {
            TypeClass::Numeric
        } else if CATEGORICAL_TYPES.contains(&base) {
            TypeClass::Categorical
        } else {
            TypeClass::Other
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeClass::Numeric)
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeClass::Numeric => "numeric",
            TypeClass::Categorical => "categorical",
            TypeClass::Other => "other",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Column Descriptors
// ============================================================================

/// Column metadata as reported by the schema provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDescriptor {
    /// Column name as it appears in the table
    pub name: String,

    /// Type class driving predicate selection
    #[serde(rename = "typeClass")]
    pub type_class: TypeClass,

    /// Declared warehouse type, when known (e.g. "bigint")
    #[serde(rename = "sqlType", skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
}

impl ColumnDescriptor {
    /// Create a new column descriptor with a name and type class
    pub fn new(name: impl Into<String>, type_class: TypeClass) -> Self {
        Self {
            name: name.into(),
            type_class,
            sql_type: None,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, TypeClass::Numeric)
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self::new(name, TypeClass::Categorical)
    }

    /// Create a descriptor from a declared SQL type, classifying it
    pub fn from_sql_type(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        let sql_type = sql_type.into();
        Self {
            name: name.into(),
            type_class: TypeClass::from_sql_type(&sql_type),
            sql_type: Some(sql_type),
        }
    }
}
