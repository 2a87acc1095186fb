//! Pairwise Relationship Detector
//!
//! Decides whether one column of dataset A and one column of dataset B look like
//! the two ends of a foreign-key style association:
//! 1. Normalize every non-null value (stringify, lower-case, trim)
//! 2. Overlap ratio = |intersection| / max(|source set|, |target set|)
//! 3. Boost by 1.2 (capped at 1.0) when the column names are similar
//! 4. Reject anything under the confidence floor
//! 5. Classify cardinality from how the matched values cover each side

use crate::dataset::{normalize_value, Dataset, Relationship, RelationshipType, Row};
use crate::similarity::name_similarity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

/// Detector thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Relationships below this confidence are never constructed
    pub min_confidence: f64,

    /// Column names more similar than this earn the boost
    pub name_similarity_threshold: f64,

    /// Multiplier applied to the overlap ratio for similar names
    pub name_boost: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            name_similarity_threshold: 0.6,
            name_boost: 1.2,
        }
    }
}

/// Normalized non-null values of one column, extracted once per detection run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnKeys {
    pub column: String,

    /// Every normalized value, duplicates kept, in row order
    pub values: Vec<String>,

    /// Deduplicated `values`
    pub unique: HashSet<String>,
}

impl ColumnKeys {
    pub fn from_rows<'a, I>(column: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let values: Vec<String> = rows
            .into_iter()
            .filter_map(|row| row.get(column).and_then(normalize_value))
            .collect();
        let unique = values.iter().cloned().collect();

        Self {
            column: column.to_string(),
            values,
            unique,
        }
    }

    pub fn from_dataset(dataset: &Dataset, column: &str) -> Self {
        Self::from_rows(column, &dataset.rows)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Pairwise relationship detector
#[derive(Debug, Clone, Default)]
pub struct RelationshipDetector {
    config: DetectorConfig,
}

impl RelationshipDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Compare `source_column` of `source` against `target_column` of `target`
    /// using every row of both datasets
    pub fn detect(
        &self,
        source: &Dataset,
        source_column: &str,
        target: &Dataset,
        target_column: &str,
    ) -> Option<Relationship> {
        let source_keys = ColumnKeys::from_dataset(source, source_column);
        let target_keys = ColumnKeys::from_dataset(target, target_column);
        self.compare(&source.id, &source_keys, &target.id, &target_keys)
    }

    /// Compare two pre-extracted columns. `None` is the expected negative result.
    pub fn compare(
        &self,
        source_file: &str,
        source: &ColumnKeys,
        target_file: &str,
        target: &ColumnKeys,
    ) -> Option<Relationship> {
        if source.is_empty() || target.is_empty() {
            return None;
        }

        let (smaller, larger) = if source.unique.len() <= target.unique.len() {
            (&source.unique, &target.unique)
        } else {
            (&target.unique, &source.unique)
        };
        let intersection: HashSet<&str> = smaller
            .iter()
            .filter(|v| larger.contains(*v))
            .map(String::as_str)
            .collect();

        if intersection.is_empty() {
            return None;
        }

        let max_unique = source.unique.len().max(target.unique.len());
        let overlap_ratio = intersection.len() as f64 / max_unique as f64;

        let names_similar =
            name_similarity(&source.column, &target.column) > self.config.name_similarity_threshold;
        let confidence = if names_similar {
            (overlap_ratio * self.config.name_boost).min(1.0)
        } else {
            overlap_ratio
        };

        if confidence < self.config.min_confidence {
            return None;
        }

        let relationship_type = classify(source, target, &intersection);

        trace!(
            source_column = %source.column,
            target_column = %target.column,
            confidence,
            %relationship_type,
            "column pair matched"
        );

        Some(Relationship {
            id: uuid::Uuid::new_v4().to_string(),
            source_file: source_file.to_string(),
            target_file: target_file.to_string(),
            source_column: source.column.clone(),
            target_column: target.column.clone(),
            relationship_type,
            confidence,
            matching_rows: intersection.len(),
        })
    }
}

/// A side is "complete" when the count of its raw (non-deduplicated) values that fall
/// in the intersection equals the size of its unique set
fn classify(
    source: &ColumnKeys,
    target: &ColumnKeys,
    intersection: &HashSet<&str>,
) -> RelationshipType {
    let matches = |keys: &ColumnKeys| {
        keys.values
            .iter()
            .filter(|v| intersection.contains(v.as_str()))
            .count()
    };

    let source_complete = matches(source) == source.unique.len();
    let target_complete = matches(target) == target.unique.len();

    match (source_complete, target_complete) {
        (true, true) => RelationshipType::OneToOne,
        (true, false) | (false, true) => RelationshipType::OneToMany,
        (false, false) => RelationshipType::ManyToMany,
    }
}
