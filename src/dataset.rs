//! Tabular Dataset Model
//!
//! In-memory representation of one parsed file plus the relationship records the
//! detector attaches to it:
//! 1. `Dataset` - identity, ordered columns, ordered rows, outgoing relationships
//! 2. `Relationship` - an inferred column-to-column association between two datasets
//! 3. Value normalization shared by detection and joining

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Scalar cell value (string, number, boolean or null)
pub type CellValue = Value;

/// One row-record: column name -> value, in insertion order
pub type Row = Map<String, Value>;

/// Opaque dataset identifier, stable for the session
pub type DatasetId = String;

pub(crate) static NULL: Value = Value::Null;

/// Cardinality classification of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::OneToOne => "one-to-one",
            RelationshipType::OneToMany => "one-to-many",
            RelationshipType::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inferred association between `source_column` of `source_file` and
/// `target_column` of `target_file`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,

    /// Dataset the relationship is attached to
    pub source_file: DatasetId,

    pub target_file: DatasetId,

    pub source_column: String,

    pub target_column: String,

    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,

    /// Confidence level (0.0 - 1.0)
    pub confidence: f64,

    /// Count of distinct overlapping normalized values
    pub matching_rows: usize,
}

/// A parsed tabular file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,

    /// Outgoing relationships, replaced wholesale on every detection run
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Dataset {
    /// Create a dataset with a fresh identifier
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, columns, rows)
    }

    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Row>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            columns,
            rows,
            relationships: Vec::new(),
        }
    }

    /// Create a dataset whose column list is the first-appearance order of keys across `rows`
    pub fn from_rows(name: impl Into<String>, rows: Vec<Row>) -> Self {
        let columns = joined_columns(&rows);
        Self::new(name, columns, rows)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Values of `column` in row order; a row missing the key yields null
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(column).unwrap_or(&NULL))
    }

    /// Normalized keys of the non-null values of `column`, in row order
    pub fn non_null_values(&self, column: &str) -> Vec<String> {
        self.column_values(column).filter_map(normalize_value).collect()
    }
}

/// Convert a value to its comparable key: stringified, lower-cased, trimmed.
/// Null and blank strings have no key.
pub fn normalize_value(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        other => other.to_string(),
    };

    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Integers up to 2^53 in magnitude have an exact `f64` form
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Render integral floats without a fractional part so `42`, `42.0` and `"42"` share a key
fn format_number(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

/// Ordered union of keys across `rows` (first appearance wins)
pub fn joined_columns(rows: &[Row]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_value_erases_types() {
        assert_eq!(normalize_value(&json!(42)), Some("42".to_string()));
        assert_eq!(normalize_value(&json!("42")), Some("42".to_string()));
        assert_eq!(normalize_value(&json!(" 42 ")), Some("42".to_string()));
        assert_eq!(normalize_value(&json!(42.0)), Some("42".to_string()));
        assert_eq!(normalize_value(&json!(4.5)), Some("4.5".to_string()));
        assert_eq!(normalize_value(&json!("  Alice ")), Some("alice".to_string()));
        assert_eq!(normalize_value(&json!(true)), Some("true".to_string()));
    }

    #[test]
    fn test_large_integral_floats_match_integers() {
        assert_eq!(
            normalize_value(&json!(1e15)),
            normalize_value(&json!(1_000_000_000_000_000i64))
        );
        assert_eq!(
            normalize_value(&json!(9_007_199_254_740_992.0)),
            Some("9007199254740992".to_string())
        );
        assert_eq!(
            normalize_value(&json!(-4_503_599_627_370_496.0)),
            Some("-4503599627370496".to_string())
        );
    }

    #[test]
    fn test_normalize_value_null_and_blank() {
        assert_eq!(normalize_value(&Value::Null), None);
        assert_eq!(normalize_value(&json!("   ")), None);
    }

    #[test]
    fn test_missing_keys_read_as_null() {
        let ds = Dataset::new(
            "people",
            vec!["id".to_string(), "name".to_string()],
            vec![row(json!({"id": 1, "name": "Al"})), row(json!({"id": 2}))],
        );

        let names: Vec<&Value> = ds.column_values("name").collect();
        assert_eq!(names, vec![&json!("Al"), &Value::Null]);
        assert_eq!(ds.non_null_values("name"), vec!["al".to_string()]);
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_from_rows_column_order() {
        let ds = Dataset::from_rows(
            "mixed",
            vec![row(json!({"b": 1, "a": 2})), row(json!({"a": 3, "c": 4}))],
        );
        assert_eq!(ds.columns, vec!["b", "a", "c"]);
        assert!(ds.has_column("c"));
        assert!(!ds.has_column("d"));
    }

    #[test]
    fn test_relationship_type_serde() {
        let json = serde_json::to_string(&RelationshipType::OneToMany).unwrap();
        assert_eq!(json, "\"one-to-many\"");
        assert_eq!(RelationshipType::ManyToMany.to_string(), "many-to-many");
    }
}
