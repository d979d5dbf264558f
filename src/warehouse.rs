//! PgWarehouse - warehouse access over the PostgreSQL wire protocol
//!
//! Implements the schema, distinct-value and execution interfaces on top of
//! a `sqlx` connection pool. Table references are `table` or
//! `schema.table`; unqualified names resolve against the configured
//! default schema.

use sqlx::postgres::{PgArguments, PgColumn, PgPoolOptions, PgRow};
use sqlx::{Column, Executor, PgPool, Row, Statement, TypeInfo};
use tracing::{debug, info};

use crate::config::WarehouseConfig;
use crate::error::{FilterError, Result};
use crate::provider::{DistinctValuesProvider, QueryExecutor, ResultSet, SchemaProvider};
use crate::query::QueryRequest;
use crate::sql::sanitize::{quote_identifier, quote_table_ref};
use crate::types::ColumnDescriptor;

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, PgArguments>;

/// Warehouse reachable through a PostgreSQL-compatible endpoint
pub struct PgWarehouse {
    /// Database connection pool
    pool: PgPool,
    /// Warehouse configuration
    config: WarehouseConfig,
}

impl PgWarehouse {
    /// Connect using the configured URL and pool size
    pub async fn connect(config: WarehouseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| FilterError::Connection(format!("Warehouse connection failed: {}", e)))?;

        Ok(Self { pool, config })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, config: WarehouseConfig) -> Self {
        Self { pool, config }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Split a table reference into `(schema, table)`
    fn split_table_ref(&self, table_ref: &str) -> Result<(String, String)> {
        let parts: Vec<&str> = table_ref.split('.').collect();
        let (schema, table) = match parts.as_slice() {
            [table] => (self.config.default_schema.as_str(), *table),
            [schema, table] => (*schema, *table),
            _ => {
                return Err(FilterError::validation(format!(
                    "Table reference '{}' must be 'table' or 'schema.table'",
                    table_ref
                )));
            }
        };

        if schema.is_empty() || table.is_empty() {
            return Err(FilterError::validation(format!(
                "Table reference '{}' has an empty part",
                table_ref
            )));
        }

        Ok((schema.to_string(), table.to_string()))
    }

    fn qualified_table_ref(&self, table_ref: &str) -> Result<String> {
        let (schema, table) = self.split_table_ref(table_ref)?;
        Ok(format!("{}.{}", schema, table))
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn bind_param<'q>(query: PgQuery<'q>, param: &'q serde_json::Value) -> Result<PgQuery<'q>> {
        Ok(match param {
            serde_json::Value::String(s) => query.bind(s.as_str()),
            serde_json::Value::Number(n) => {
                if let Some(int_val) = n.as_i64() {
                    query.bind(int_val)
                } else if let Some(float_val) = n.as_f64() {
                    query.bind(float_val)
                } else {
                    return Err(FilterError::validation(format!(
                        "Parameter {} is out of range",
                        n
                    )));
                }
            }
            serde_json::Value::Bool(b) => query.bind(*b),
            serde_json::Value::Null => query.bind(None::<String>),
            other => {
                return Err(FilterError::validation(format!(
                    "Unsupported parameter value: {}",
                    other
                )));
            }
        })
    }

    /// Wrap `sql` so that columns without a native decoder come back as text
    ///
    /// Output columns are renamed positionally (`c1`, `c2`, ...) so duplicate
    /// names in the projection stay addressable. Returns `None` when every
    /// column decodes natively.
    fn wrap_text_casts(sql: &str, type_names: &[&str]) -> Option<String> {
        if type_names.iter().all(|name| decodes_natively(name)) {
            return None;
        }

        let aliases: Vec<String> = (1..=type_names.len()).map(|i| format!("c{}", i)).collect();
        let select_list: Vec<String> = aliases
            .iter()
            .zip(type_names)
            .map(|(alias, name)| {
                if decodes_natively(name) {
                    alias.clone()
                } else {
                    format!("{}::text", alias)
                }
            })
            .collect();

        Some(format!(
            "SELECT {} FROM ({}) AS q({})",
            select_list.join(", "),
            sql,
            aliases.join(", ")
        ))
    }

    fn rows_to_result_set(columns: Vec<String>, rows: &[PgRow]) -> Result<ResultSet> {
        let values = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| Self::extract_column_value(row, col))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResultSet::new(columns, values))
    }

    fn extract_column_value(row: &PgRow, column: &PgColumn) -> Result<serde_json::Value> {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "BOOL" => row
                .try_get::<Option<bool>, _>(idx)?
                .map(serde_json::Value::Bool),
            "INT2" => row
                .try_get::<Option<i16>, _>(idx)?
                .map(serde_json::Value::from),
            "INT4" => row
                .try_get::<Option<i32>, _>(idx)?
                .map(serde_json::Value::from),
            "INT8" => row
                .try_get::<Option<i64>, _>(idx)?
                .map(serde_json::Value::from),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(idx)?
                .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
                .map(serde_json::Value::Number),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(idx)?
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number),
            "NUMERIC" => {
                use rust_decimal::prelude::ToPrimitive;
                row.try_get::<Option<rust_decimal::Decimal>, _>(idx)?
                    .and_then(|d| d.to_f64())
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
            }
            "JSON" | "JSONB" => row.try_get::<Option<serde_json::Value>, _>(idx)?,
            "TIMESTAMPTZ" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)?
                .map(|v| serde_json::Value::String(v.to_rfc3339())),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(idx)?
                .map(|v| serde_json::Value::String(v.to_string())),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(idx)?
                .map(|v| serde_json::Value::String(v.to_string())),
            // TEXT, VARCHAR, BPCHAR, NAME; other types arrive cast to TEXT
            _ => row
                .try_get::<Option<String>, _>(idx)?
                .map(serde_json::Value::String),
        };

        Ok(value.unwrap_or(serde_json::Value::Null))
    }
}

/// Column types `extract_column_value` decodes without a text cast
const NATIVE_TYPES: &[&str] = &[
    "BOOL",
    "INT2",
    "INT4",
    "INT8",
    "FLOAT4",
    "FLOAT8",
    "NUMERIC",
    "JSON",
    "JSONB",
    "TIMESTAMPTZ",
    "TIMESTAMP",
    "DATE",
    "TEXT",
    "VARCHAR",
    "BPCHAR",
    "NAME",
];

fn decodes_natively(type_name: &str) -> bool {
    NATIVE_TYPES.contains(&type_name)
}

impl SchemaProvider for PgWarehouse {
    async fn get_columns(&self, table_ref: &str) -> Result<Vec<ColumnDescriptor>> {
        let (schema, table) = self.split_table_ref(table_ref)?;

        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT column_name::text, data_type::text
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(&schema)
        .bind(&table)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(FilterError::table_not_found(table_ref));
        }

        debug!(table = table_ref, columns = rows.len(), "loaded column metadata");

        Ok(rows
            .into_iter()
            .map(|(name, data_type)| ColumnDescriptor::from_sql_type(name, data_type))
            .collect())
    }

    async fn get_sample_rows(&self, table_ref: &str, limit: u64) -> Result<ResultSet> {
        let request = QueryRequest::new(table_ref, "*").with_limit(limit);
        self.execute(&request).await
    }
}

impl DistinctValuesProvider for PgWarehouse {
    async fn get_distinct_values(&self, table_ref: &str, column: &str) -> Result<Vec<String>> {
        let columns = self.get_columns(table_ref).await?;
        if !columns.iter().any(|c| c.name == column) {
            return Err(FilterError::unknown_column(column));
        }

        let table = quote_table_ref(&self.qualified_table_ref(table_ref)?);
        let column_sql = quote_identifier(column);

        let mut sql = format!(
            "SELECT d.v::text FROM (SELECT DISTINCT {} AS v FROM {} WHERE {} IS NOT NULL) d ORDER BY d.v ASC",
            column_sql, table, column_sql
        );

        let mut query_limit = None;
        if let Some(limit) = self.config.distinct_limit {
            sql.push_str(" LIMIT $1");
            query_limit = Some(i64::try_from(limit).map_err(|_| {
                FilterError::configuration(format!("distinct_limit {} is too large", limit))
            })?);
        }

        let mut query = sqlx::query_as::<_, (String,)>(&sql);
        if let Some(limit) = query_limit {
            query = query.bind(limit);
        }

        let rows = query.fetch_all(&self.pool).await?;
        debug!(table = table_ref, column, values = rows.len(), "loaded distinct values");

        Ok(rows.into_iter().map(|(value,)| value).collect())
    }
}

impl QueryExecutor for PgWarehouse {
    async fn execute(&self, request: &QueryRequest) -> Result<ResultSet> {
        let mut qualified = request.clone();
        qualified.table_ref = self.qualified_table_ref(&request.table_ref)?;

        let query = qualified.to_parameterized();
        debug!(sql = %query.sql, params = query.params.len(), "executing query");

        // Describe first so empty results keep their header
        let statement = self.pool.prepare(&query.sql).await?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let type_names: Vec<&str> = statement
            .columns()
            .iter()
            .map(|c| c.type_info().name())
            .collect();
        let sql = Self::wrap_text_casts(&query.sql, &type_names)
            .unwrap_or_else(|| query.sql.clone());

        let mut sqlx_query = sqlx::query(&sql);
        for param in &query.params {
            sqlx_query = Self::bind_param(sqlx_query, param)?;
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        let result = Self::rows_to_result_set(columns, &rows)?;

        info!(table = %qualified.table_ref, rows = result.len(), "query executed");
        Ok(result)
    }
}
