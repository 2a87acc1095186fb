//! Scheduling wrappers around relationship detection
//!
//! Provides two alternatives to the synchronous builder:
//! - Cooperative: yields to the host runtime at dataset and dataset-pair boundaries
//!   through an injected `Yielder`, checking a cancellation flag at each yield point
//! - Parallel: shards the column-pair comparisons across blocking tokio workers;
//!   shard results are concatenated in launch order before the acceptance filter
//!
//! Both produce the same relationships, in the same order, as
//! `RelationshipSetBuilder::detect_relationships`.

use crate::builder::{attach, dataset_pairs, RelationshipSetBuilder};
use crate::config::RelateConfig;
use crate::dataset::{Dataset, Relationship};
use crate::detector::ColumnKeys;
use crate::error::{RelateError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Hands control back to the host between chunks of work
#[async_trait]
pub trait Yielder: Send + Sync {
    async fn yield_point(&self);
}

/// Never yields; runs straight through
#[derive(Debug, Clone, Copy, Default)]
pub struct NoYield;

#[async_trait]
impl Yielder for NoYield {
    async fn yield_point(&self) {}
}

/// Yields to the tokio scheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioYield;

#[async_trait]
impl Yielder for TokioYield {
    async fn yield_point(&self) {
        tokio::task::yield_now().await;
    }
}

/// Shared cancellation flag, checked only at yield points
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(RelateError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Relationship detection that yields between datasets and dataset pairs
pub async fn detect_relationships_cooperative(
    datasets: &[Dataset],
    config: &RelateConfig,
    yielder: &dyn Yielder,
    cancel: &CancellationFlag,
) -> Result<Vec<Dataset>> {
    let builder = RelationshipSetBuilder::new(config);

    let mut keys: Vec<Vec<ColumnKeys>> = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        cancel.check()?;
        keys.push(builder.extract_keys(dataset));
        yielder.yield_point().await;
    }

    let mut found: Vec<Vec<Relationship>> = vec![Vec::new(); datasets.len()];
    for (i, j) in dataset_pairs(datasets.len()) {
        cancel.check()?;
        let accepted = builder.compare_pair(&datasets[i], &keys[i], &datasets[j], &keys[j]);
        debug!(
            source = %datasets[i].name,
            target = %datasets[j].name,
            accepted = accepted.len(),
            "compared dataset pair"
        );
        found[i].extend(accepted);
        yielder.yield_point().await;
    }
    cancel.check()?;

    Ok(attach(datasets, found))
}

/// Relationship detection with column-pair comparisons sharded across worker threads
pub async fn detect_relationships_parallel(
    datasets: &[Dataset],
    config: &RelateConfig,
) -> Result<Vec<Dataset>> {
    let builder = Arc::new(RelationshipSetBuilder::new(config));

    let mut extract_handles = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        let builder = Arc::clone(&builder);
        let dataset = dataset.clone();
        extract_handles.push(tokio::task::spawn_blocking(move || {
            Arc::new(builder.extract_keys(&dataset))
        }));
    }
    let mut keys: Vec<Arc<Vec<ColumnKeys>>> = Vec::with_capacity(datasets.len());
    for handle in extract_handles {
        keys.push(handle.await?);
    }

    // One shard per (dataset pair, source column)
    let mut shards = Vec::new();
    for (i, j) in dataset_pairs(datasets.len()) {
        for source_idx in 0..keys[i].len() {
            let builder = Arc::clone(&builder);
            let source_keys = Arc::clone(&keys[i]);
            let target_keys = Arc::clone(&keys[j]);
            let source_id = datasets[i].id.clone();
            let target_id = datasets[j].id.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let source = &source_keys[source_idx];
                target_keys
                    .iter()
                    .filter_map(|target| {
                        builder.detector().compare(&source_id, source, &target_id, target)
                    })
                    .collect::<Vec<Relationship>>()
            });
            shards.push((i, handle));
        }
    }

    info!(datasets = datasets.len(), shards = shards.len(), "sharded relationship detection");

    let mut found: Vec<Vec<Relationship>> = vec![Vec::new(); datasets.len()];
    for (i, handle) in shards {
        let candidates = handle.await?;
        found[i].extend(candidates.into_iter().filter(|rel| builder.accepts(rel)));
    }

    Ok(attach(datasets, found))
}
