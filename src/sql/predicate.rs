//! Predicate building for SQL WHERE clauses
//!
//! Converts a [`Selection`] into typed [`Predicate`]s using each column's
//! [`TypeClass`], and wraps them into a [`QueryRequest`].
//!
//! # Dispatch
//! - `Equality` on any column: `col = 'v'`
//! - `MembershipSet` on a non-numeric column: `col IN ('a', 'b')`
//! - `Range` on a numeric column: `col BETWEEN min AND max`
//!
//! Any other combination is an `InvalidSelectionKind` error.

use tracing::{debug, warn};

use crate::config::{BuilderConfig, EmptyValuePolicy, RangePolicy, UnknownColumnPolicy};
use crate::error::{FilterError, Result};
use crate::query::{Predicate, PredicateKind, Projection, QueryRequest};
use crate::selection::{Selection, ValueSpec};
use crate::types::{ColumnDescriptor, TypeClass};

/// Builds filter queries from column metadata and user selections
///
/// Holds only its policies; every call is independent.
#[derive(Debug, Clone, Default)]
pub struct PredicateBuilder {
    config: BuilderConfig,
}

impl PredicateBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build the full query for `table_ref`
    ///
    /// # Arguments
    /// * `table_ref` - Table reference, printed as given in the query text
    /// * `columns` - Column metadata from the schema provider
    /// * `selection` - User-chosen column/value pairs, in display order
    /// * `projection` - `"*"` or a fixed column list
    ///
    /// # Example
    /// ```
    /// use warehouse_filter::{ColumnDescriptor, PredicateBuilder, Selection};
    ///
    /// let columns = vec![
    ///     ColumnDescriptor::categorical("age_group"),
    ///     ColumnDescriptor::numeric("total_crc_spend_l1y"),
    /// ];
    /// let selection = Selection::new()
    ///     .one_of("age_group", ["18-24", "25-34"])
    ///     .between("total_crc_spend_l1y", 100.0, 5000.0);
    ///
    /// let request = PredicateBuilder::default()
    ///     .build("t1", &columns, &selection, "*")
    ///     .unwrap();
    /// assert_eq!(
    ///     request.text(),
    ///     "SELECT * FROM t1 WHERE 1=1 AND age_group IN ('18-24', '25-34') AND total_crc_spend_l1y BETWEEN 100 AND 5000"
    /// );
    /// ```
    pub fn build(
        &self,
        table_ref: &str,
        columns: &[ColumnDescriptor],
        selection: &Selection,
        projection: impl Into<Projection>,
    ) -> Result<QueryRequest> {
        let predicates = self.build_predicates(columns, selection)?;

        let mut request = QueryRequest::new(table_ref, projection).with_predicates(predicates);
        if let Some(limit) = self.config.row_limit {
            request = request.with_limit(limit);
        }

        debug!(
            table = table_ref,
            predicates = request.predicates.len(),
            sql = %request.text(),
            "built filter query"
        );
        Ok(request)
    }

    /// Build one predicate per non-empty selection entry, in selection order
    pub fn build_predicates(
        &self,
        columns: &[ColumnDescriptor],
        selection: &Selection,
    ) -> Result<Vec<Predicate>> {
        let mut predicates = Vec::with_capacity(selection.len());

        for (name, spec) in selection.iter() {
            let Some(column) = columns.iter().find(|c| c.name == name) else {
                match self.config.unknown_columns {
                    UnknownColumnPolicy::Ignore => {
                        warn!(column = name, "ignoring selection for unknown column");
                        continue;
                    }
                    UnknownColumnPolicy::Reject => {
                        return Err(FilterError::unknown_column(name));
                    }
                }
            };

            if let Some(predicate) = self.build_predicate(column, spec)? {
                predicates.push(predicate);
            }
        }

        Ok(predicates)
    }

    /// Build the predicate for a single column
    ///
    /// Returns `Ok(None)` when the value is empty and the policy is to skip.
    pub fn build_predicate(
        &self,
        column: &ColumnDescriptor,
        spec: &ValueSpec,
    ) -> Result<Option<Predicate>> {
        let kind = match (column.type_class, spec) {
            (_, ValueSpec::Equality { value }) => {
                if value.is_empty() {
                    return self.empty_value(&column.name);
                }
                PredicateKind::Equals(value.clone())
            }
            (TypeClass::Categorical | TypeClass::Other, ValueSpec::MembershipSet { values }) => {
                if values.is_empty() {
                    return self.empty_value(&column.name);
                }
                PredicateKind::In(values.clone())
            }
            (TypeClass::Numeric, ValueSpec::Range { min, max }) => {
                self.check_range(&column.name, *min, *max)?;
                PredicateKind::Between {
                    min: *min,
                    max: *max,
                }
            }
            (type_class, spec @ (ValueSpec::MembershipSet { .. } | ValueSpec::Range { .. })) => {
                return Err(FilterError::invalid_selection_kind(
                    &column.name,
                    type_class,
                    spec.kind_name(),
                ));
            }
        };

        Ok(Some(Predicate::new(&column.name, kind)))
    }

    fn empty_value(&self, column: &str) -> Result<Option<Predicate>> {
        match self.config.empty_values {
            EmptyValuePolicy::Skip => Ok(None),
            EmptyValuePolicy::Reject => Err(FilterError::EmptySelection(column.to_string())),
        }
    }

    fn check_range(&self, column: &str, min: f64, max: f64) -> Result<()> {
        let malformed = || FilterError::MalformedRange {
            column: column.to_string(),
            min,
            max,
        };

        if !min.is_finite() || !max.is_finite() {
            return Err(malformed());
        }

        if min > max {
            match self.config.inverted_ranges {
                RangePolicy::Reject => return Err(malformed()),
                RangePolicy::PassThrough => {
                    warn!(column, min, max, "passing through inverted range");
                }
            }
        }

        Ok(())
    }
}

/// Build a query with the default policies
pub fn build_query(
    table_ref: &str,
    columns: &[ColumnDescriptor],
    selection: &Selection,
    projection: impl Into<Projection>,
) -> Result<QueryRequest> {
    PredicateBuilder::default().build(table_ref, columns, selection, projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::categorical("age_group"),
            ColumnDescriptor::numeric("total_crc_spend_l1y"),
            ColumnDescriptor::categorical("region"),
            ColumnDescriptor::new("signup_date", TypeClass::Other),
        ]
    }

    // ==================== End-to-end ====================

    #[test]
    fn test_end_to_end_example() {
        let selection = Selection::new()
            .one_of("age_group", ["18-24", "25-34"])
            .between("total_crc_spend_l1y", 100.0, 5000.0);

        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();

        assert_eq!(
            request.text(),
            "SELECT * FROM t1 WHERE 1=1 AND age_group IN ('18-24', '25-34') AND total_crc_spend_l1y BETWEEN 100 AND 5000"
        );
    }

    #[test]
    fn test_empty_selection_returns_base_clause() {
        let request = build_query("t1", &customer_columns(), &Selection::new(), "*").unwrap();
        assert_eq!(request.text(), "SELECT * FROM t1 WHERE 1=1");
        assert!(request.predicates.is_empty());
    }

    #[test]
    fn test_predicates_follow_selection_order() {
        let selection = Selection::new()
            .between("total_crc_spend_l1y", 0.0, 1.0)
            .equals("region", "north")
            .one_of("age_group", ["18-24"]);

        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        let columns: Vec<&str> = request.predicates.iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, vec!["total_crc_spend_l1y", "region", "age_group"]);
    }

    #[test]
    fn test_fixed_projection() {
        let selection = Selection::new().equals("region", "north");
        let request =
            build_query("t1", &customer_columns(), &selection, "age_group, region").unwrap();
        assert_eq!(
            request.text(),
            "SELECT age_group, region FROM t1 WHERE 1=1 AND region = 'north'"
        );
    }

    #[test]
    fn test_row_limit_from_config() {
        let builder = PredicateBuilder::new(BuilderConfig::new().with_row_limit(50));
        let request = builder
            .build("t1", &customer_columns(), &Selection::new(), "*")
            .unwrap();
        assert_eq!(request.text(), "SELECT * FROM t1 WHERE 1=1 LIMIT 50");
    }

    // ==================== Equality ====================

    #[test]
    fn test_equality_any_type_class() {
        let selection = Selection::new()
            .equals("region", "north")
            .equals("signup_date", "2024-01-01")
            .equals("total_crc_spend_l1y", "100");

        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        assert_eq!(
            request.text(),
            "SELECT * FROM t1 WHERE 1=1 AND region = 'north' AND signup_date = '2024-01-01' AND total_crc_spend_l1y = '100'"
        );
    }

    #[test]
    fn test_empty_equality_skipped() {
        let selection = Selection::new().equals("region", "");
        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        assert_eq!(request.text(), "SELECT * FROM t1 WHERE 1=1");
    }

    #[test]
    fn test_equality_escapes_quotes() {
        let selection = Selection::new().equals("region", "x' OR '1'='1");
        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        assert_eq!(
            request.text(),
            "SELECT * FROM t1 WHERE 1=1 AND region = 'x'' OR ''1''=''1'"
        );
    }

    // ==================== Membership ====================

    #[test]
    fn test_empty_membership_skipped() {
        let selection = Selection::new()
            .one_of("age_group", Vec::<String>::new())
            .equals("region", "south");

        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        assert_eq!(request.text(), "SELECT * FROM t1 WHERE 1=1 AND region = 'south'");
    }

    #[test]
    fn test_membership_on_other_column() {
        let selection = Selection::new().one_of("signup_date", ["2024-01-01", "2024-02-01"]);
        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        assert_eq!(
            request.predicates[0].kind,
            PredicateKind::In(vec!["2024-01-01".to_string(), "2024-02-01".to_string()])
        );
    }

    #[test]
    fn test_empty_value_rejected_when_configured() {
        let builder =
            PredicateBuilder::new(BuilderConfig::new().with_empty_values(EmptyValuePolicy::Reject));

        let selection = Selection::new().one_of("age_group", Vec::<String>::new());
        let result = builder.build("t1", &customer_columns(), &selection, "*");
        assert!(matches!(result, Err(FilterError::EmptySelection(c)) if c == "age_group"));

        let selection = Selection::new().equals("region", "");
        let result = builder.build("t1", &customer_columns(), &selection, "*");
        assert!(matches!(result, Err(FilterError::EmptySelection(c)) if c == "region"));
    }

    // ==================== Type Mismatch ====================

    #[test]
    fn test_range_on_categorical_is_invalid() {
        let selection = Selection::new().between("age_group", 1.0, 2.0);
        let result = build_query("t1", &customer_columns(), &selection, "*");

        match result {
            Err(FilterError::InvalidSelectionKind {
                column,
                type_class,
                kind,
            }) => {
                assert_eq!(column, "age_group");
                assert_eq!(type_class, TypeClass::Categorical);
                assert_eq!(kind, "range");
            }
            other => panic!("Expected InvalidSelectionKind, got {:?}", other),
        }
    }

    #[test]
    fn test_membership_on_numeric_is_invalid() {
        let selection = Selection::new().one_of("total_crc_spend_l1y", ["100"]);
        let result = build_query("t1", &customer_columns(), &selection, "*");
        assert!(matches!(
            result,
            Err(FilterError::InvalidSelectionKind { kind: "membership set", .. })
        ));
    }

    #[test]
    fn test_range_on_other_is_invalid() {
        let selection = Selection::new().between("signup_date", 1.0, 2.0);
        let result = build_query("t1", &customer_columns(), &selection, "*");
        assert!(matches!(
            result,
            Err(FilterError::InvalidSelectionKind { type_class: TypeClass::Other, .. })
        ));
    }

    #[test]
    fn test_mismatch_after_valid_entries_still_fails() {
        let selection = Selection::new()
            .equals("region", "north")
            .between("age_group", 1.0, 2.0);
        assert!(build_query("t1", &customer_columns(), &selection, "*").is_err());
    }

    // ==================== Ranges ====================

    #[test]
    fn test_inverted_range_rejected_by_default() {
        let selection = Selection::new().between("total_crc_spend_l1y", 10.0, 1.0);
        let result = build_query("t1", &customer_columns(), &selection, "*");
        assert!(matches!(result, Err(FilterError::MalformedRange { .. })));
    }

    #[test]
    fn test_inverted_range_pass_through() {
        let builder =
            PredicateBuilder::new(BuilderConfig::new().with_inverted_ranges(RangePolicy::PassThrough));
        let selection = Selection::new().between("total_crc_spend_l1y", 10.0, 1.0);

        let request = builder
            .build("t1", &customer_columns(), &selection, "*")
            .unwrap();
        assert_eq!(
            request.text(),
            "SELECT * FROM t1 WHERE 1=1 AND total_crc_spend_l1y BETWEEN 10 AND 1"
        );
    }

    #[test]
    fn test_equal_bounds_allowed() {
        let selection = Selection::new().between("total_crc_spend_l1y", 5.0, 5.0);
        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        assert_eq!(
            request.text(),
            "SELECT * FROM t1 WHERE 1=1 AND total_crc_spend_l1y BETWEEN 5 AND 5"
        );
    }

    #[test]
    fn test_non_finite_range_always_rejected() {
        let builder =
            PredicateBuilder::new(BuilderConfig::new().with_inverted_ranges(RangePolicy::PassThrough));
        for (min, max) in [(f64::NAN, 1.0), (0.0, f64::INFINITY), (f64::NEG_INFINITY, 0.0)] {
            let selection = Selection::new().between("total_crc_spend_l1y", min, max);
            let result = builder.build("t1", &customer_columns(), &selection, "*");
            assert!(matches!(result, Err(FilterError::MalformedRange { .. })));
        }
    }

    // ==================== Unknown Columns ====================

    #[test]
    fn test_unknown_column_ignored_by_default() {
        let selection = Selection::new()
            .equals("does_not_exist", "x")
            .equals("region", "north");

        let request = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        assert_eq!(request.text(), "SELECT * FROM t1 WHERE 1=1 AND region = 'north'");
    }

    #[test]
    fn test_unknown_column_rejected_when_configured() {
        let builder = PredicateBuilder::new(BuilderConfig::strict());
        let selection = Selection::new().equals("does_not_exist", "x");

        let result = builder.build("t1", &customer_columns(), &selection, "*");
        assert!(matches!(result, Err(FilterError::UnknownColumn(c)) if c == "does_not_exist"));
    }

    // ==================== Determinism ====================

    #[test]
    fn test_build_is_deterministic() {
        let selection = Selection::new()
            .one_of("age_group", ["25-34", "18-24"])
            .between("total_crc_spend_l1y", 1.5, 99.25)
            .equals("region", "west");

        let first = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        let second = build_query("t1", &customer_columns(), &selection, "*").unwrap();
        assert_eq!(first.text(), second.text());
        assert_eq!(first.to_parameterized(), second.to_parameterized());
    }
}
