//! Relationship Set Builder
//!
//! Runs the pairwise detector over every unordered pair of datasets (A before B in
//! the working list) and every column combination, keeps the strong matches and
//! attaches them to the source dataset. Each run recomputes everything from scratch
//! and replaces the attached lists; nothing is patched incrementally.

use crate::config::RelateConfig;
use crate::dataset::{Dataset, Relationship};
use crate::detector::{ColumnKeys, RelationshipDetector};
use crate::sampling::Sampler;
use itertools::{iproduct, Itertools};
use tracing::{debug, info};

/// Relationship set builder
#[derive(Debug, Clone)]
pub struct RelationshipSetBuilder {
    detector: RelationshipDetector,
    sampler: Sampler,
    acceptance_threshold: f64,
}

impl Default for RelationshipSetBuilder {
    fn default() -> Self {
        Self::new(&RelateConfig::default())
    }
}

impl RelationshipSetBuilder {
    pub fn new(config: &RelateConfig) -> Self {
        Self {
            detector: RelationshipDetector::new(config.detector.clone()),
            sampler: Sampler::new(config.sample_size, config.sampling.clone()),
            acceptance_threshold: config.acceptance_threshold,
        }
    }

    pub fn detector(&self) -> &RelationshipDetector {
        &self.detector
    }

    /// Whether a detected relationship survives into the attached set
    /// (strictly above the threshold)
    pub fn accepts(&self, relationship: &Relationship) -> bool {
        relationship.confidence > self.acceptance_threshold
    }

    /// Sample `dataset` once and normalize every column of the sample
    pub fn extract_keys(&self, dataset: &Dataset) -> Vec<ColumnKeys> {
        let rows = self.sampler.sample_rows(dataset);
        dataset
            .columns
            .iter()
            .map(|column| ColumnKeys::from_rows(column, rows.iter().copied()))
            .collect()
    }

    /// Accepted relationships from `a` to `b`, in column-list order
    pub fn compare_pair(
        &self,
        a: &Dataset,
        a_keys: &[ColumnKeys],
        b: &Dataset,
        b_keys: &[ColumnKeys],
    ) -> Vec<Relationship> {
        iproduct!(a_keys.iter(), b_keys.iter())
            .filter_map(|(source, target)| self.detector.compare(&a.id, source, &b.id, target))
            .filter(|rel| self.accepts(rel))
            .collect()
    }

    /// Return copies of `datasets` whose relationship lists are replaced with a
    /// freshly detected set
    pub fn detect_relationships(&self, datasets: &[Dataset]) -> Vec<Dataset> {
        info!(
            datasets = datasets.len(),
            sample_size = %self.sampler.size,
            "detecting relationships"
        );

        let keys: Vec<Vec<ColumnKeys>> = datasets.iter().map(|ds| self.extract_keys(ds)).collect();
        let mut found: Vec<Vec<Relationship>> = vec![Vec::new(); datasets.len()];

        for (i, j) in dataset_pairs(datasets.len()) {
            let accepted = self.compare_pair(&datasets[i], &keys[i], &datasets[j], &keys[j]);
            debug!(
                source = %datasets[i].name,
                target = %datasets[j].name,
                accepted = accepted.len(),
                "compared dataset pair"
            );
            found[i].extend(accepted);
        }

        let result = attach(datasets, found);
        info!(
            relationships = result.iter().map(|ds| ds.relationships.len()).sum::<usize>(),
            "relationship detection finished"
        );
        result
    }
}

/// Unordered dataset index pairs `(i, j)` with `i < j`, in list order
pub fn dataset_pairs(len: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..len).tuple_combinations()
}

/// Clone `datasets`, replacing each relationship list with the matching entry of `found`
pub(crate) fn attach(datasets: &[Dataset], found: Vec<Vec<Relationship>>) -> Vec<Dataset> {
    datasets
        .iter()
        .zip(found)
        .map(|(ds, relationships)| Dataset {
            relationships,
            ..ds.clone()
        })
        .collect()
}

/// Detect relationships across `datasets` with `config`
pub fn detect_relationships(datasets: &[Dataset], config: &RelateConfig) -> Vec<Dataset> {
    RelationshipSetBuilder::new(config).detect_relationships(datasets)
}

/// Every attached relationship, flattened in dataset order
pub fn all_relationships(datasets: &[Dataset]) -> Vec<Relationship> {
    datasets
        .iter()
        .flat_map(|ds| ds.relationships.iter().cloned())
        .collect()
}
