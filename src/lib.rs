//! # warehouse-filter
//!
//! Type-aware filter building for analytical warehouse tables.
//!
//! Given a table's column metadata and the values a user picked for some of
//! its columns, this crate produces a well-formed filter query: equality for
//! single values, `IN` for value sets on categorical columns and `BETWEEN`
//! for ranges on numeric columns. Queries render both as readable text and
//! as a parameterized statement, and the parameterized form is what gets
//! executed.
//!
//! ## Features
//!
//! - **Typed selections**: `ValueSpec` is a closed enum checked against each
//!   column's `TypeClass`; mismatches fail instead of producing bad SQL
//! - **Bound parameters**: values are never inlined into executed SQL
//! - **Configurable policies**: unknown columns, inverted ranges and empty
//!   value lists can be skipped or rejected
//! - **Warehouse access**: column metadata, sample rows, distinct values and
//!   query execution over a PostgreSQL-protocol pool
//! - **Explicit sessions**: per-user state lives in a `Session` value
//!
//! ## Quick Start
//!
//! ```rust
//! use warehouse_filter::{ColumnDescriptor, Selection, build_query};
//!
//! let columns = vec![
//!     ColumnDescriptor::categorical("age_group"),
//!     ColumnDescriptor::numeric("total_crc_spend_l1y"),
//! ];
//!
//! let selection = Selection::new()
//!     .one_of("age_group", ["18-24", "25-34"])
//!     .between("total_crc_spend_l1y", 100.0, 5000.0);
//!
//! let request = build_query("t1", &columns, &selection, "*").unwrap();
//! assert_eq!(
//!     request.text(),
//!     "SELECT * FROM t1 WHERE 1=1 AND age_group IN ('18-24', '25-34') AND total_crc_spend_l1y BETWEEN 100 AND 5000"
//! );
//!
//! let executed = request.to_parameterized();
//! assert_eq!(executed.params.len(), 4);
//! ```
//!
//! ## Running Against a Warehouse
//!
//! ```rust,no_run
//! use warehouse_filter::{Selection, Session, WarehouseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WarehouseConfig::from_credentials_file("credentials.json")?
//!         .sample_limit(10)
//!         .build()?;
//!     let session = Session::open(config).await?;
//!
//!     let choices = session.distinct_values("customers", "age_group").await?;
//!     let selection = Selection::new().one_of("age_group", choices.into_iter().take(2));
//!
//!     let (request, rows) = session.filter("customers", &selection, "*").await?;
//!     println!("{}\n{} rows", request, rows.len());
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod query;
pub mod selection;
pub mod session;
pub mod sql;
pub mod types;
pub mod warehouse;

// Re-export main types for convenience
pub use config::{
    BuilderConfig, Credentials, EmptyValuePolicy, RangePolicy, UnknownColumnPolicy,
    WarehouseConfig, WarehouseConfigBuilder,
};
pub use error::{FilterError, Result};
pub use provider::{
    DEFAULT_CSV_FILE_NAME, DistinctValuesProvider, QueryExecutor, ResultSet, SchemaProvider,
};
pub use query::{ParameterizedQuery, Predicate, PredicateKind, Projection, QueryRequest};
pub use selection::{Selection, SelectionEntry, ValueSpec};
pub use session::Session;
pub use sql::predicate::{PredicateBuilder, build_query};
pub use types::{ColumnDescriptor, TypeClass};
pub use warehouse::PgWarehouse;
