//! Sampling Strategies
//!
//! Bounds the cost of relationship detection and profiling on large datasets.
//! The sampler never returns more rows than the configured cap, whatever the
//! size of the input.

use crate::dataset::{Dataset, Row};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default per-dataset sample cap
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// How many rows of each dataset to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SampleSizeRepr", into = "SampleSizeRepr")]
pub enum SampleSize {
    /// At most this many rows
    Rows(usize),
    /// Every row (exact, slow above a few thousand rows)
    Full,
}

impl SampleSize {
    /// Row cap, or `None` for full scans
    pub fn cap(&self) -> Option<usize> {
        match self {
            SampleSize::Rows(n) => Some(*n),
            SampleSize::Full => None,
        }
    }
}

impl Default for SampleSize {
    fn default() -> Self {
        SampleSize::Rows(DEFAULT_SAMPLE_SIZE)
    }
}

impl fmt::Display for SampleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSize::Rows(n) => write!(f, "{}", n),
            SampleSize::Full => f.write_str("full"),
        }
    }
}

impl FromStr for SampleSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("full") {
            return Ok(SampleSize::Full);
        }
        trimmed
            .parse::<usize>()
            .map(SampleSize::Rows)
            .map_err(|_| format!("invalid sample size '{}': expected a row count or \"full\"", s))
    }
}

/// Wire form: a number or the string "full"
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SampleSizeRepr {
    Rows(usize),
    Keyword(String),
}

impl TryFrom<SampleSizeRepr> for SampleSize {
    type Error = String;

    fn try_from(repr: SampleSizeRepr) -> Result<Self, Self::Error> {
        match repr {
            SampleSizeRepr::Rows(n) => Ok(SampleSize::Rows(n)),
            SampleSizeRepr::Keyword(s) => s.parse(),
        }
    }
}

impl From<SampleSize> for SampleSizeRepr {
    fn from(size: SampleSize) -> Self {
        match size {
            SampleSize::Rows(n) => SampleSizeRepr::Rows(n),
            SampleSize::Full => SampleSizeRepr::Keyword("full".to_string()),
        }
    }
}

/// Sampling strategy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingStrategy {
    /// Evenly spaced rows across the whole dataset
    #[default]
    Stratified,

    /// Seeded random subset, kept in original row order
    Random { seed: u64 },
}

/// Row sampler
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    pub size: SampleSize,
    pub strategy: SamplingStrategy,
}

impl Sampler {
    pub fn new(size: SampleSize, strategy: SamplingStrategy) -> Self {
        Self { size, strategy }
    }

    /// Row indices to keep for a dataset of `len` rows, ascending
    pub fn sample_indices(&self, len: usize) -> Vec<usize> {
        let cap = match self.size.cap() {
            Some(cap) if cap < len => cap,
            _ => return (0..len).collect(),
        };

        match &self.strategy {
            SamplingStrategy::Stratified => {
                let step = len as f64 / cap as f64;
                (0..cap).map(|i| (i as f64 * step).floor() as usize).collect()
            }
            SamplingStrategy::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                let mut indices: Vec<usize> = (0..len).collect();
                indices.shuffle(&mut rng);
                indices.truncate(cap);
                indices.sort_unstable();
                indices
            }
        }
    }

    /// Borrow the sampled rows of `dataset`
    pub fn sample_rows<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Row> {
        self.sample_indices(dataset.row_count())
            .into_iter()
            .map(|idx| &dataset.rows[idx])
            .collect()
    }
}
