//! Session - one user's query-building session
//!
//! A session owns the warehouse handle and the builder policies for as
//! long as the user is working. It is created with [`Session::open`] (or
//! [`Session::new`] for a custom warehouse) and ended with
//! [`Session::close`]; nothing about it lives in process-wide state.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::{BuilderConfig, WarehouseConfig};
use crate::error::Result;
use crate::provider::{DistinctValuesProvider, QueryExecutor, ResultSet, SchemaProvider};
use crate::query::{Projection, QueryRequest};
use crate::selection::Selection;
use crate::sql::predicate::PredicateBuilder;
use crate::types::ColumnDescriptor;
use crate::warehouse::PgWarehouse;

/// Default number of preview rows
const DEFAULT_SAMPLE_LIMIT: u64 = 5;

/// Query-building session bound to one warehouse
pub struct Session<W = PgWarehouse> {
    id: Uuid,
    opened_at: DateTime<Utc>,
    warehouse: W,
    builder: PredicateBuilder,
    sample_limit: u64,
}

impl Session<PgWarehouse> {
    /// Connect to the configured warehouse and start a session
    pub async fn open(config: WarehouseConfig) -> Result<Self> {
        let filter = config.filter.clone();
        let sample_limit = config.sample_limit;
        let warehouse = PgWarehouse::connect(config).await?;

        Ok(Self::new(warehouse, filter).with_sample_limit(sample_limit))
    }

    /// End the session and release its connections
    pub async fn close(self) {
        info!(session_id = %self.id, "closing session");
        self.warehouse.close().await;
    }
}

impl<W> Session<W>
where
    W: SchemaProvider + DistinctValuesProvider + QueryExecutor,
{
    /// Start a session over any warehouse implementation
    pub fn new(warehouse: W, filter: BuilderConfig) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            warehouse,
            builder: PredicateBuilder::new(filter),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        };
        info!(session_id = %session.id, "session opened");
        session
    }

    /// Set the number of preview rows
    pub fn with_sample_limit(mut self, limit: u64) -> Self {
        self.sample_limit = limit;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    pub fn builder(&self) -> &PredicateBuilder {
        &self.builder
    }

    /// Column metadata for a table
    pub async fn columns(&self, table_ref: &str) -> Result<Vec<ColumnDescriptor>> {
        self.warehouse.get_columns(table_ref).await
    }

    /// A few sample rows, for seeding filter defaults
    pub async fn preview(&self, table_ref: &str) -> Result<ResultSet> {
        self.warehouse
            .get_sample_rows(table_ref, self.sample_limit)
            .await
    }

    /// Candidate values for a membership filter on `column`
    pub async fn distinct_values(&self, table_ref: &str, column: &str) -> Result<Vec<String>> {
        self.warehouse.get_distinct_values(table_ref, column).await
    }

    /// Look up the table's columns and build the filter query
    pub async fn build_query(
        &self,
        table_ref: &str,
        selection: &Selection,
        projection: impl Into<Projection>,
    ) -> Result<QueryRequest> {
        let columns = self.columns(table_ref).await?;
        self.builder
            .build(table_ref, &columns, selection, projection)
    }

    /// Run a built query
    pub async fn run(&self, request: &QueryRequest) -> Result<ResultSet> {
        let result = self.warehouse.execute(request).await?;
        info!(
            session_id = %self.id,
            table = %request.table_ref,
            rows = result.len(),
            "filter query returned"
        );
        Ok(result)
    }

    /// Build and run in one step, returning the query alongside its rows
    pub async fn filter(
        &self,
        table_ref: &str,
        selection: &Selection,
        projection: impl Into<Projection>,
    ) -> Result<(QueryRequest, ResultSet)> {
        let request = self.build_query(table_ref, selection, projection).await?;
        let result = self.run(&request).await?;
        Ok((request, result))
    }
}
