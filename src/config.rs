//! Configuration for the predicate builder and the warehouse connection
//!
//! Provides a builder pattern for the warehouse connection and chained
//! setters for builder policies.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::sql::sanitize::validate_identifier;

// ============================================================================
// Builder Policies
// ============================================================================

/// What to do with a selection entry whose column is not in the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownColumnPolicy {
    /// Drop the entry and keep building
    #[default]
    Ignore,
    /// Fail with `UnknownColumn`
    Reject,
}

/// What to do with a range whose `min` is greater than its `max`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// Fail with `MalformedRange`
    #[default]
    Reject,
    /// Emit the predicate as given (matches nothing)
    PassThrough,
}

/// What to do with an empty equality value or an empty membership set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyValuePolicy {
    /// Emit no predicate for the column
    #[default]
    Skip,
    /// Fail with `EmptySelection`
    Reject,
}

/// Policies applied by the predicate builder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default)]
    pub unknown_columns: UnknownColumnPolicy,
    #[serde(default)]
    pub inverted_ranges: RangePolicy,
    #[serde(default)]
    pub empty_values: EmptyValuePolicy,
    /// Optional row limit appended to every built query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u64>,
}

impl BuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict configuration: unknown columns, inverted ranges and empty
    /// values all fail
    pub fn strict() -> Self {
        Self {
            unknown_columns: UnknownColumnPolicy::Reject,
            inverted_ranges: RangePolicy::Reject,
            empty_values: EmptyValuePolicy::Reject,
            row_limit: None,
        }
    }

    pub fn with_unknown_columns(mut self, policy: UnknownColumnPolicy) -> Self {
        self.unknown_columns = policy;
        self
    }

    pub fn with_inverted_ranges(mut self, policy: RangePolicy) -> Self {
        self.inverted_ranges = policy;
        self
    }

    pub fn with_empty_values(mut self, policy: EmptyValuePolicy) -> Self {
        self.empty_values = policy;
        self
    }

    pub fn with_row_limit(mut self, limit: u64) -> Self {
        self.row_limit = Some(limit);
        self
    }
}

// ============================================================================
// Warehouse Connection
// ============================================================================

/// Credentials document, as uploaded by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// PostgreSQL-protocol connection URL
    pub database_url: String,
    /// Schema used for unqualified table names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,
}

/// Configuration for a warehouse session
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Warehouse connection URL
    pub database_url: String,
    /// Schema used for unqualified table names (default: "public")
    pub default_schema: String,
    /// Maximum pooled connections (default: 5)
    pub max_connections: u32,
    /// Number of sample rows fetched for previews (default: 5)
    pub sample_limit: u64,
    /// Cap on distinct values returned per column (default: none)
    pub distinct_limit: Option<u64>,
    /// Predicate builder policies
    pub filter: BuilderConfig,
}

impl WarehouseConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> WarehouseConfigBuilder {
        WarehouseConfigBuilder::new(database_url)
    }

    /// Start a builder from a credentials JSON document
    pub fn from_credentials_json(json: &str) -> Result<WarehouseConfigBuilder> {
        let credentials: Credentials = serde_json::from_str(json)?;
        if credentials.database_url.trim().is_empty() {
            return Err(FilterError::configuration(
                "credentials are missing database_url",
            ));
        }

        let mut builder = WarehouseConfigBuilder::new(credentials.database_url);
        if let Some(schema) = credentials.default_schema {
            builder = builder.default_schema(schema);
        }
        Ok(builder)
    }

    /// Start a builder from a credentials file on disk
    pub fn from_credentials_file(path: impl AsRef<Path>) -> Result<WarehouseConfigBuilder> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_credentials_json(&contents)
    }
}

/// Builder for WarehouseConfig
#[derive(Debug)]
pub struct WarehouseConfigBuilder {
    database_url: String,
    default_schema: String,
    max_connections: u32,
    sample_limit: u64,
    distinct_limit: Option<u64>,
    filter: BuilderConfig,
}

impl WarehouseConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            default_schema: "public".to_string(),
            max_connections: 5,
            sample_limit: 5,
            distinct_limit: None,
            filter: BuilderConfig::default(),
        }
    }

    /// Set the schema used for unqualified table names (default: "public")
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    /// Set the pool size (default: 5)
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the number of preview rows (default: 5)
    pub fn sample_limit(mut self, limit: u64) -> Self {
        self.sample_limit = limit;
        self
    }

    /// Cap the number of distinct values listed per column
    pub fn distinct_limit(mut self, limit: u64) -> Self {
        self.distinct_limit = Some(limit);
        self
    }

    /// Set the predicate builder policies
    pub fn filter(mut self, filter: BuilderConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Build the configuration, validating the default schema name
    pub fn build(self) -> Result<WarehouseConfig> {
        validate_identifier(&self.default_schema).map_err(FilterError::Configuration)?;
        if self.max_connections == 0 {
            return Err(FilterError::configuration(
                "max_connections must be at least 1",
            ));
        }

        Ok(WarehouseConfig {
            database_url: self.database_url,
            default_schema: self.default_schema,
            max_connections: self.max_connections,
            sample_limit: self.sample_limit,
            distinct_limit: self.distinct_limit,
            filter: self.filter,
        })
    }
}
