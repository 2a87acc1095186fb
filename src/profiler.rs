//! Column Profiler
//!
//! Classifies a column as numeric, date, categorical or text from a bounded sample
//! of its values. Advisory only: relationship detection works on normalized value
//! overlap and never consults the semantic type.

use crate::dataset::{normalize_value, Dataset, NULL};
use crate::sampling::{SampleSize, Sampler, SamplingStrategy};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

lazy_static! {
    /// Cheap shape check before trying the chrono formats
    static ref DATE_SHAPE: Regex = Regex::new(concat!(
        r"(?i)^(\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}",
        r"|[a-z]{3,9}\.? \d{1,2},? \d{2,4}",
        r"|\d{1,2} [a-z]{3,9},? \d{2,4}",
        r"|[a-z]{3}, \d{1,2} [a-z]{3} \d{4})",
    ))
    .unwrap();
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Numeric,
    Date,
    Categorical,
    Text,
}

/// Profile of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub semantic_type: SemanticType,

    /// Distinct normalized non-null values in the sample
    pub cardinality: usize,

    /// Null or blank values in the sample
    pub null_count: usize,

    pub non_null_count: usize,
}

/// Profiler thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Share of non-null values that must parse as numbers
    pub numeric_ratio: f64,

    /// Share of non-null values that must parse as calendar dates
    pub date_ratio: f64,

    /// Categorical when distinct values < sample size * this ratio
    pub categorical_ratio: f64,

    /// Rows to profile; `None` follows the engine-wide sample size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<SampleSize>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            numeric_ratio: 0.8,
            date_ratio: 0.8,
            categorical_ratio: 0.5,
            sample_size: None,
        }
    }
}

/// Column profiler
#[derive(Debug, Clone, Default)]
pub struct ColumnProfiler {
    config: ProfilerConfig,
}

impl ColumnProfiler {
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    /// Profile every column of `dataset`, in column order
    pub fn profile_dataset(&self, dataset: &Dataset) -> Vec<ColumnProfile> {
        dataset
            .columns
            .iter()
            .map(|column| self.profile_column(dataset, column))
            .collect()
    }

    pub fn profile_column(&self, dataset: &Dataset, column: &str) -> ColumnProfile {
        let size = self.config.sample_size.unwrap_or_default();
        let sampler = Sampler::new(size, SamplingStrategy::Stratified);
        let values: Vec<&Value> = sampler
            .sample_rows(dataset)
            .into_iter()
            .map(|row| row.get(column).unwrap_or(&NULL))
            .collect();

        self.profile_values(column, &values)
    }

    /// Profile an already-extracted list of values
    pub fn profile_values(&self, name: &str, values: &[&Value]) -> ColumnProfile {
        let mut present: Vec<&Value> = Vec::with_capacity(values.len());
        let mut distinct: HashSet<String> = HashSet::new();
        for &value in values {
            if let Some(key) = normalize_value(value) {
                distinct.insert(key);
                present.push(value);
            }
        }

        let non_null_count = present.len();
        let semantic_type = self.classify(&present, distinct.len());

        ColumnProfile {
            name: name.to_string(),
            semantic_type,
            cardinality: distinct.len(),
            null_count: values.len() - non_null_count,
            non_null_count,
        }
    }

    fn classify(&self, present: &[&Value], distinct: usize) -> SemanticType {
        if present.is_empty() {
            return SemanticType::Text;
        }

        let total = present.len() as f64;

        let numeric = present.iter().filter(|v| is_numeric(v)).count() as f64;
        if numeric / total >= self.config.numeric_ratio {
            return SemanticType::Numeric;
        }

        let dates = present.iter().filter(|v| is_date(v)).count() as f64;
        if dates / total >= self.config.date_ratio {
            return SemanticType::Date;
        }

        if (distinct as f64) < total * self.config.categorical_ratio {
            return SemanticType::Categorical;
        }

        SemanticType::Text
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false),
        _ => false,
    }
}

fn is_date(value: &Value) -> bool {
    match value {
        Value::String(s) => parse_date(s.trim()),
        _ => false,
    }
}

/// Whether `s` is a valid calendar date in one of the recognised formats
pub fn parse_date(s: &str) -> bool {
    if !DATE_SHAPE.is_match(s) {
        return false;
    }

    if DateTime::parse_from_rfc3339(s).is_ok() || DateTime::parse_from_rfc2822(s).is_ok() {
        return true;
    }

    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(s, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
}
