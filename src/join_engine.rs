//! Join Engine
//!
//! Materializes one flat table from several datasets and their accepted
//! relationships. The first dataset is the base; each relationship with exactly one
//! end already joined pulls the other end in through a left join:
//! - every base row survives, unmatched rows exactly once and unchanged
//! - matched rows fan out, one output row per matching incoming row
//! - incoming columns that collide with existing keys become `{dataset}_{column}`
//!
//! Missing datasets and relationships that cannot be chained are skipped, never
//! reported as errors. Cardinality is informational and does not change the join.

use crate::dataset::{normalize_value, Dataset, Relationship, Row};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// How relationships are chained onto the growing result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainMode {
    /// One pass in list order; a relationship whose predecessor comes later is dropped
    SinglePass,

    /// Repeat passes over unresolved relationships until a pass joins nothing new
    #[default]
    FixedPoint,
}

/// Joined rows plus which relationships were used
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinReport {
    pub rows: Vec<Row>,

    /// Ids of relationships that were joined, in application order
    pub applied: Vec<String>,

    /// Ids of relationships that were skipped (missing dataset or never chainable)
    pub skipped: Vec<String>,
}

/// Join engine
#[derive(Debug, Clone, Default)]
pub struct JoinEngine {
    chain_mode: ChainMode,
}

impl JoinEngine {
    pub fn new(chain_mode: ChainMode) -> Self {
        Self { chain_mode }
    }

    pub fn join(&self, datasets: &[Dataset], relationships: &[Relationship]) -> Vec<Row> {
        self.join_with_report(datasets, relationships).rows
    }

    pub fn join_with_report(
        &self,
        datasets: &[Dataset],
        relationships: &[Relationship],
    ) -> JoinReport {
        if datasets.len() < 2 || relationships.is_empty() {
            return JoinReport::default();
        }

        let by_id: HashMap<&str, &Dataset> =
            datasets.iter().map(|ds| (ds.id.as_str(), ds)).collect();
        let base = &datasets[0];

        let mut result: Vec<Row> = base.rows.clone();
        let mut processed: HashSet<&str> = HashSet::from([base.id.as_str()]);
        let mut applied = Vec::new();
        let mut skipped = Vec::new();
        let mut pending: Vec<&Relationship> = relationships.iter().collect();

        loop {
            let mut progressed = false;
            let mut deferred = Vec::new();

            for rel in pending {
                let (source, target) = match (
                    by_id.get(rel.source_file.as_str()),
                    by_id.get(rel.target_file.as_str()),
                ) {
                    (Some(source), Some(target)) => (*source, *target),
                    _ => {
                        debug!(
                            relationship = %rel.id,
                            "skipping relationship with missing dataset"
                        );
                        skipped.push(rel.id.clone());
                        continue;
                    }
                };

                let step = match (
                    processed.contains(source.id.as_str()),
                    processed.contains(target.id.as_str()),
                ) {
                    (true, false) => Some((
                        rel.source_column.as_str(),
                        target,
                        rel.target_column.as_str(),
                    )),
                    (false, true) => Some((
                        rel.target_column.as_str(),
                        source,
                        rel.source_column.as_str(),
                    )),
                    _ => None,
                };

                match step {
                    Some((base_key, incoming, incoming_key)) => {
                        result = left_join(&result, base_key, incoming, incoming_key);
                        processed.insert(incoming.id.as_str());
                        applied.push(rel.id.clone());
                        progressed = true;
                        debug!(
                            dataset = %incoming.name,
                            base_key,
                            incoming_key,
                            rows = result.len(),
                            "joined dataset"
                        );
                    }
                    None => deferred.push(rel),
                }
            }

            pending = deferred;
            if self.chain_mode == ChainMode::SinglePass || !progressed || pending.is_empty() {
                break;
            }
        }

        skipped.extend(pending.into_iter().map(|rel| rel.id.clone()));

        info!(
            rows = result.len(),
            applied = applied.len(),
            skipped = skipped.len(),
            "join finished"
        );

        JoinReport {
            rows: result,
            applied,
            skipped,
        }
    }
}

/// Join `datasets` along `relationships` with the default chain mode
pub fn join_datasets(datasets: &[Dataset], relationships: &[Relationship]) -> Vec<Row> {
    JoinEngine::default().join(datasets, relationships)
}

/// Left join `base` rows against `incoming` on normalized key values
fn left_join(base: &[Row], base_key: &str, incoming: &Dataset, incoming_key: &str) -> Vec<Row> {
    let mut lookup: HashMap<String, Vec<&Row>> = HashMap::new();
    for row in &incoming.rows {
        if let Some(key) = row.get(incoming_key).and_then(normalize_value) {
            lookup.entry(key).or_default().push(row);
        }
    }

    let mut out = Vec::with_capacity(base.len());
    for row in base {
        let matches = row
            .get(base_key)
            .and_then(normalize_value)
            .and_then(|key| lookup.get(&key));

        match matches {
            Some(incoming_rows) => {
                for incoming_row in incoming_rows {
                    out.push(merge_row(row, incoming_row, &incoming.name));
                }
            }
            None => out.push(row.clone()),
        }
    }
    out
}

fn merge_row(base: &Row, incoming: &Row, incoming_name: &str) -> Row {
    let mut merged = base.clone();
    for (column, value) in incoming {
        let key = if merged.contains_key(column) {
            format!("{}_{}", incoming_name, column)
        } else {
            column.clone()
        };
        merged.insert(key, value.clone());
    }
    merged
}
