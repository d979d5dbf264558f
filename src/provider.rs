//! Collaborator interfaces around the predicate builder
//!
//! The builder itself is pure; these traits describe where its inputs come
//! from (column metadata, distinct values) and where its output goes (query
//! execution). [`crate::warehouse::PgWarehouse`] implements all three.

use std::future::Future;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FilterError, Result};
use crate::query::QueryRequest;
use crate::types::ColumnDescriptor;

/// Tabular query result with ordered columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in select order
    pub columns: Vec<String>,
    /// Row values, aligned with `columns`
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows, as a new result set
    pub fn head(&self, n: usize) -> ResultSet {
        ResultSet {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Values of one column, in row order
    pub fn column_values(&self, column: &str) -> Option<Vec<&serde_json::Value>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    /// Rows as JSON objects keyed by column name
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Write the result as CSV: a header row, then one record per row
    ///
    /// Nulls become empty fields; strings are written as-is and other
    /// values in their JSON form. The header is written even when there are
    /// no rows.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        if self.is_empty() {
            warn!(columns = self.columns.len(), "exporting a result set with no rows");
        }

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(csv_field))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Render the result as a CSV string
    pub fn to_csv(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| FilterError::validation(format!("CSV output is not UTF-8: {}", e)))
    }

    /// Write the result as CSV to a file, replacing it if present
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

/// File name used for exported results
pub const DEFAULT_CSV_FILE_NAME: &str = "query_results.csv";

fn csv_field(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Source of table metadata and preview rows
pub trait SchemaProvider {
    /// Columns of `table_ref`, in table order
    fn get_columns(
        &self,
        table_ref: &str,
    ) -> impl Future<Output = Result<Vec<ColumnDescriptor>>> + Send;

    /// Up to `limit` representative rows of `table_ref`
    fn get_sample_rows(
        &self,
        table_ref: &str,
        limit: u64,
    ) -> impl Future<Output = Result<ResultSet>> + Send;
}

/// Source of candidate values for membership filters
pub trait DistinctValuesProvider {
    /// Distinct non-null values of `column`, ascending
    fn get_distinct_values(
        &self,
        table_ref: &str,
        column: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Runs finished queries
pub trait QueryExecutor {
    fn execute(&self, request: &QueryRequest) -> impl Future<Output = Result<ResultSet>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResultSet {
        ResultSet::new(
            vec!["id".to_string(), "age_group".to_string()],
            vec![
                vec![json!(1), json!("18-24")],
                vec![json!(2), json!("25-34")],
                vec![json!(3), json!(null)],
            ],
        )
    }

    #[test]
    fn test_len_and_head() {
        let rs = sample();
        assert_eq!(rs.len(), 3);
        assert!(!rs.is_empty());

        let head = rs.head(2);
        assert_eq!(head.len(), 2);
        assert_eq!(head.columns, rs.columns);
        assert_eq!(rs.head(10).len(), 3);
    }

    #[test]
    fn test_column_values() {
        let rs = sample();
        let values = rs.column_values("age_group").unwrap();
        assert_eq!(values, vec![&json!("18-24"), &json!("25-34"), &json!(null)]);
        assert!(rs.column_values("missing").is_none());
    }

    #[test]
    fn test_records() {
        let records = sample().records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["id"], json!(1));
        assert_eq!(records[1]["age_group"], json!("25-34"));
    }

    #[test]
    fn test_empty_result_set() {
        let rs = ResultSet::default();
        assert!(rs.is_empty());
        assert!(rs.records().is_empty());
    }

    // ==================== CSV Export Tests ====================

    #[test]
    fn test_to_csv_header_and_rows() {
        let csv = sample().to_csv().unwrap();
        assert_eq!(csv, "id,age_group\n1,18-24\n2,25-34\n3,\n");
    }

    #[test]
    fn test_to_csv_quotes_special_characters() {
        let rs = ResultSet::new(
            vec!["region".to_string(), "note".to_string()],
            vec![vec![json!("O'Brien, Jr."), json!("say \"hi\"\nbye")]],
        );
        let csv = rs.to_csv().unwrap();
        assert_eq!(
            csv,
            "region,note\n\"O'Brien, Jr.\",\"say \"\"hi\"\"\nbye\"\n"
        );
    }

    #[test]
    fn test_to_csv_non_string_values() {
        let rs = ResultSet::new(
            vec!["spend".to_string(), "active".to_string(), "tags".to_string()],
            vec![vec![json!(4200.5), json!(true), json!(null)]],
        );
        assert_eq!(rs.to_csv().unwrap(), "spend,active,tags\n4200.5,true,\n");
    }

    #[test]
    fn test_to_csv_empty_result_keeps_header() {
        let rs = ResultSet::new(vec!["id".to_string(), "region".to_string()], vec![]);
        assert_eq!(rs.to_csv().unwrap(), "id,region\n");
    }

    #[test]
    fn test_save_csv() {
        let path = std::env::temp_dir().join(format!(
            "{}-{}",
            uuid::Uuid::new_v4(),
            DEFAULT_CSV_FILE_NAME
        ));
        sample().save_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written, sample().to_csv().unwrap());
    }
}
