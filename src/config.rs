//! Engine configuration
//!
//! Thresholds, sampling and chaining knobs, loaded from JSON with per-field
//! defaults and optionally overridden from `RELATE_*` environment variables.

use crate::detector::DetectorConfig;
use crate::error::{RelateError, Result};
use crate::join_engine::ChainMode;
use crate::profiler::ProfilerConfig;
use crate::sampling::{SampleSize, SamplingStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const ENV_SAMPLE_SIZE: &str = "RELATE_SAMPLE_SIZE";
pub const ENV_ACCEPTANCE_THRESHOLD: &str = "RELATE_ACCEPTANCE_THRESHOLD";
pub const ENV_MIN_CONFIDENCE: &str = "RELATE_MIN_CONFIDENCE";
pub const ENV_CHAIN_MODE: &str = "RELATE_CHAIN_MODE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelateConfig {
    /// Rows per dataset fed to the detector
    pub sample_size: SampleSize,

    pub sampling: SamplingStrategy,

    pub detector: DetectorConfig,

    /// Relationships must be strictly above this to be attached
    pub acceptance_threshold: f64,

    pub chain_mode: ChainMode,

    pub profiler: ProfilerConfig,
}

impl Default for RelateConfig {
    fn default() -> Self {
        Self {
            sample_size: SampleSize::default(),
            sampling: SamplingStrategy::default(),
            detector: DetectorConfig::default(),
            acceptance_threshold: 0.5,
            chain_mode: ChainMode::default(),
            profiler: ProfilerConfig::default(),
        }
    }
}

impl RelateConfig {
    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelateConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `RELATE_*` overrides from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_SAMPLE_SIZE) {
            self.sample_size = raw.parse().map_err(RelateError::Config)?;
            debug!(sample_size = %self.sample_size, "sample size overridden");
        }

        if let Some(raw) = lookup(ENV_ACCEPTANCE_THRESHOLD) {
            self.acceptance_threshold = parse_ratio(ENV_ACCEPTANCE_THRESHOLD, &raw)?;
        }

        if let Some(raw) = lookup(ENV_MIN_CONFIDENCE) {
            self.detector.min_confidence = parse_ratio(ENV_MIN_CONFIDENCE, &raw)?;
        }

        if let Some(raw) = lookup(ENV_CHAIN_MODE) {
            self.chain_mode = match raw.trim().to_lowercase().as_str() {
                "single-pass" | "single_pass" => ChainMode::SinglePass,
                "fixed-point" | "fixed_point" => ChainMode::FixedPoint,
                other => {
                    return Err(RelateError::Config(format!(
                        "{}: unknown chain mode '{}'",
                        ENV_CHAIN_MODE, other
                    )))
                }
            };
        }

        self.validate()?;
        Ok(self)
    }

    /// Profiler settings with the sample size resolved; an unset profiler size
    /// follows `sample_size`
    pub fn profiler_config(&self) -> ProfilerConfig {
        ProfilerConfig {
            sample_size: Some(self.profiler.sample_size.unwrap_or(self.sample_size)),
            ..self.profiler.clone()
        }
    }

    /// Reject thresholds outside [0, 1] and empty samples
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("acceptance_threshold", self.acceptance_threshold),
            ("detector.min_confidence", self.detector.min_confidence),
            ("detector.name_similarity_threshold", self.detector.name_similarity_threshold),
            ("profiler.numeric_ratio", self.profiler.numeric_ratio),
            ("profiler.date_ratio", self.profiler.date_ratio),
            ("profiler.categorical_ratio", self.profiler.categorical_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(RelateError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.detector.name_boost < 1.0 {
            return Err(RelateError::Config(format!(
                "detector.name_boost must be at least 1.0, got {}",
                self.detector.name_boost
            )));
        }

        let empty = SampleSize::Rows(0);
        if self.sample_size == empty || self.profiler.sample_size == Some(empty) {
            return Err(RelateError::Config("sample size must be positive".to_string()));
        }

        Ok(())
    }
}

fn parse_ratio(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| RelateError::Config(format!("{}: {}", key, e)))
}
