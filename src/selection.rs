//! User selections: which values each column is filtered on
//!
//! A [`Selection`] keeps insertion order, so the generated predicates follow
//! the order in which the user picked columns.

use serde::{Deserialize, Serialize};

/// Value specification for one column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSpec {
    /// Single value match (`col = 'v'`)
    Equality { value: String },

    /// Any of a set of discrete values (`col IN ('a', 'b')`)
    MembershipSet { values: Vec<String> },

    /// Inclusive numeric interval (`col BETWEEN min AND max`)
    Range { min: f64, max: f64 },
}

impl ValueSpec {
    pub fn equality(value: impl Into<String>) -> Self {
        ValueSpec::Equality {
            value: value.into(),
        }
    }

    pub fn membership<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueSpec::MembershipSet {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        ValueSpec::Range { min, max }
    }

    /// Short name of the variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueSpec::Equality { .. } => "equality",
            ValueSpec::MembershipSet { .. } => "membership set",
            ValueSpec::Range { .. } => "range",
        }
    }
}

/// One column/value pair of a selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionEntry {
    pub column: String,
    #[serde(flatten)]
    pub spec: ValueSpec,
}

/// Ordered mapping from column name to value spec
///
/// Each column appears at most once. Inserting an existing column replaces
/// its spec and keeps its original position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<SelectionEntry>", into = "Vec<SelectionEntry>")]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the spec for a column
    pub fn insert(&mut self, column: impl Into<String>, spec: ValueSpec) -> Option<ValueSpec> {
        let column = column.into();
        match self.entries.iter_mut().find(|e| e.column == column) {
            Some(entry) => Some(std::mem::replace(&mut entry.spec, spec)),
            None => {
                self.entries.push(SelectionEntry { column, spec });
                None
            }
        }
    }

    /// Builder-style insert
    pub fn with(mut self, column: impl Into<String>, spec: ValueSpec) -> Self {
        self.insert(column, spec);
        self
    }

    pub fn equals(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(column, ValueSpec::equality(value))
    }

    pub fn one_of<I, S>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(column, ValueSpec::membership(values))
    }

    pub fn between(self, column: impl Into<String>, min: f64, max: f64) -> Self {
        self.with(column, ValueSpec::range(min, max))
    }

    pub fn remove(&mut self, column: &str) -> Option<ValueSpec> {
        let idx = self.entries.iter().position(|e| e.column == column)?;
        Some(self.entries.remove(idx).spec)
    }

    pub fn get(&self, column: &str) -> Option<&ValueSpec> {
        self.entries
            .iter()
            .find(|e| e.column == column)
            .map(|e| &e.spec)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(column, spec)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueSpec)> {
        self.entries.iter().map(|e| (e.column.as_str(), &e.spec))
    }
}

impl From<Vec<SelectionEntry>> for Selection {
    fn from(entries: Vec<SelectionEntry>) -> Self {
        let mut selection = Selection::new();
        for entry in entries {
            selection.insert(entry.column, entry.spec);
        }
        selection
    }
}

impl From<Selection> for Vec<SelectionEntry> {
    fn from(selection: Selection) -> Self {
        selection.entries
    }
}

impl<K: Into<String>> FromIterator<(K, ValueSpec)> for Selection {
    fn from_iter<T: IntoIterator<Item = (K, ValueSpec)>>(iter: T) -> Self {
        let mut selection = Selection::new();
        for (column, spec) in iter {
            selection.insert(column, spec);
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let selection = Selection::new()
            .equals("zeta", "z")
            .between("alpha", 1.0, 2.0)
            .one_of("mid", ["a", "b"]);

        let columns: Vec<&str> = selection.iter().map(|(c, _)| c).collect();
        assert_eq!(columns, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut selection = Selection::new().equals("a", "1").equals("b", "2");
        let previous = selection.insert("a", ValueSpec::equality("3"));

        assert_eq!(previous, Some(ValueSpec::equality("1")));
        assert_eq!(selection.len(), 2);
        let pairs: Vec<_> = selection.iter().collect();
        assert_eq!(pairs[0], ("a", &ValueSpec::equality("3")));
        assert_eq!(pairs[1].0, "b");
    }

    #[test]
    fn test_remove() {
        let mut selection = Selection::new().equals("a", "1").equals("b", "2");
        assert!(selection.remove("a").is_some());
        assert!(selection.remove("a").is_none());
        assert!(!selection.contains("a"));
        assert!(selection.contains("b"));
    }

    #[test]
    fn test_value_spec_serialization() {
        let json = serde_json::to_string(&ValueSpec::range(1.0, 5.5)).unwrap();
        assert_eq!(json, r#"{"kind":"range","min":1.0,"max":5.5}"#);

        let spec: ValueSpec =
            serde_json::from_str(r#"{"kind":"membership_set","values":["x","y"]}"#).unwrap();
        assert_eq!(spec, ValueSpec::membership(["x", "y"]));
    }

    #[test]
    fn test_selection_serialization_keeps_order() {
        let selection = Selection::new()
            .one_of("age_group", ["18-24"])
            .between("spend", 0.0, 10.0);

        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"column": "age_group", "kind": "membership_set", "values": ["18-24"]},
                {"column": "spend", "kind": "range", "min": 0.0, "max": 10.0}
            ])
        );

        let back: Selection = serde_json::from_value(json).unwrap();
        assert_eq!(back, selection);
    }

    #[test]
    fn test_deserialize_duplicates_keeps_last_spec() {
        let selection: Selection = serde_json::from_str(
            r#"[
                {"column": "a", "kind": "equality", "value": "first"},
                {"column": "b", "kind": "equality", "value": "x"},
                {"column": "a", "kind": "equality", "value": "second"}
            ]"#,
        )
        .unwrap();

        assert_eq!(selection.len(), 2);
        assert_eq!(selection.get("a"), Some(&ValueSpec::equality("second")));
        assert_eq!(selection.iter().next().map(|(c, _)| c), Some("a"));
    }

    #[test]
    fn test_from_iterator() {
        let selection: Selection = vec![
            ("a", ValueSpec::equality("1")),
            ("b", ValueSpec::range(0.0, 1.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(selection.len(), 2);
    }
}
