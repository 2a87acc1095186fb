//! Workspace - the current working set of datasets
//!
//! Adding or removing a dataset re-runs relationship detection over the whole set
//! and replaces every attached relationship list, so no relationship outlives the
//! datasets it was computed against.

use crate::builder::{all_relationships, RelationshipSetBuilder};
use crate::config::RelateConfig;
use crate::dataset::{Dataset, Relationship, RelationshipType, Row};
use crate::join_engine::{JoinEngine, JoinReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Relationship counts grouped by cardinality type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSummary {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub average_confidence: Option<f64>,
}

impl RelationshipSummary {
    pub fn from_relationships(relationships: &[Relationship]) -> Self {
        let mut by_type = BTreeMap::new();
        for rel in relationships {
            *by_type.entry(rel.relationship_type.to_string()).or_insert(0) += 1;
        }

        let average_confidence = if relationships.is_empty() {
            None
        } else {
            let total: f64 = relationships.iter().map(|r| r.confidence).sum();
            Some(total / relationships.len() as f64)
        };

        Self {
            total: relationships.len(),
            by_type,
            average_confidence,
        }
    }

    pub fn count(&self, relationship_type: RelationshipType) -> usize {
        self.by_type.get(relationship_type.as_str()).copied().unwrap_or(0)
    }
}

/// Working set of datasets with their current relationships
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    config: RelateConfig,
    datasets: Vec<Dataset>,
}

impl Workspace {
    pub fn new(config: RelateConfig) -> Self {
        Self {
            config,
            datasets: Vec::new(),
        }
    }

    pub fn config(&self) -> &RelateConfig {
        &self.config
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn get(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|ds| ds.id == id)
    }

    /// Add a dataset and recompute all relationships. Returns the dataset id.
    ///
    /// A dataset whose id is already present replaces the old one in place.
    pub fn add_dataset(&mut self, dataset: Dataset) -> String {
        let id = dataset.id.clone();
        match self.datasets.iter().position(|ds| ds.id == id) {
            Some(idx) => {
                info!(dataset = %dataset.name, rows = dataset.row_count(), "replacing dataset");
                self.datasets[idx] = dataset;
            }
            None => {
                info!(dataset = %dataset.name, rows = dataset.row_count(), "adding dataset");
                self.datasets.push(dataset);
            }
        }
        self.recompute();
        id
    }

    /// Remove a dataset by id and recompute. Returns the removed dataset, if any.
    pub fn remove_dataset(&mut self, id: &str) -> Option<Dataset> {
        let idx = self.datasets.iter().position(|ds| ds.id == id)?;
        let mut removed = self.datasets.remove(idx);
        removed.relationships.clear();
        info!(dataset = %removed.name, "removed dataset");
        self.recompute();
        Some(removed)
    }

    /// Every current relationship, flattened in dataset order
    pub fn relationships(&self) -> Vec<Relationship> {
        all_relationships(&self.datasets)
    }

    pub fn relationship_summary(&self) -> RelationshipSummary {
        RelationshipSummary::from_relationships(&self.relationships())
    }

    pub fn join(&self) -> JoinReport {
        JoinEngine::new(self.config.chain_mode)
            .join_with_report(&self.datasets, &self.relationships())
    }

    pub fn joined_rows(&self) -> Vec<Row> {
        self.join().rows
    }

    fn recompute(&mut self) {
        self.datasets =
            RelationshipSetBuilder::new(&self.config).detect_relationships(&self.datasets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn dataset(id: &str, columns: &[&str], values: Vec<Value>) -> Dataset {
        let rows = values.into_iter().map(|v| v.as_object().cloned().unwrap()).collect();
        Dataset::with_id(id, id, columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn products() -> Dataset {
        dataset(
            "products",
            &["sku", "title"],
            vec![
                json!({"sku": "A-1", "title": "Lamp"}),
                json!({"sku": "A-2", "title": "Desk"}),
            ],
        )
    }

    fn sales() -> Dataset {
        dataset(
            "sales",
            &["sku", "units"],
            vec![
                json!({"sku": "A-1", "units": 3}),
                json!({"sku": "A-1", "units": 1}),
                json!({"sku": "A-2", "units": 7}),
            ],
        )
    }

    #[test]
    fn test_add_triggers_detection() {
        let mut ws = Workspace::default();
        ws.add_dataset(products());
        assert!(ws.relationships().is_empty());

        ws.add_dataset(sales());
        let rels = ws.relationships();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source_column, "sku");

        let summary = ws.relationship_summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.count(RelationshipType::OneToMany), 1);
        assert_eq!(summary.count(RelationshipType::ManyToMany), 0);
    }

    #[test]
    fn test_remove_drops_stale_relationships() {
        let mut ws = Workspace::default();
        ws.add_dataset(products());
        ws.add_dataset(sales());

        let removed = ws.remove_dataset("sales").unwrap();
        assert_eq!(removed.name, "sales");
        assert!(ws.relationships().is_empty());
        assert!(ws.get("products").unwrap().relationships.is_empty());
        assert!(ws.remove_dataset("sales").is_none());
    }

    #[test]
    fn test_same_id_replaces_dataset() {
        let mut ws = Workspace::default();
        ws.add_dataset(products());
        ws.add_dataset(sales());

        let restocked = dataset(
            "products",
            &["sku", "title"],
            vec![json!({"sku": "A-1", "title": "Lamp v2"})],
        );
        assert_eq!(ws.add_dataset(restocked), "products");

        assert_eq!(ws.datasets().len(), 2);
        assert_eq!(ws.datasets()[0].row_count(), 1);
        assert_eq!(ws.datasets()[0].rows[0]["title"], json!("Lamp v2"));

        let rels = ws.relationships();
        assert!(rels.iter().all(|r| r.source_file != r.target_file));
        assert!(ws.join().skipped.is_empty());
    }

    #[test]
    fn test_adding_same_dataset_twice_is_idempotent() {
        let mut ws = Workspace::default();
        ws.add_dataset(products());
        ws.add_dataset(products());

        assert_eq!(ws.datasets().len(), 1);
        assert!(ws.relationships().is_empty());
    }

    #[test]
    fn test_joined_rows() {
        let mut ws = Workspace::default();
        ws.add_dataset(products());
        ws.add_dataset(sales());

        let rows = ws.joined_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["title"], json!("Lamp"));
        assert_eq!(rows[0]["units"], json!(3));
        assert_eq!(rows[0]["sales_sku"], json!("A-1"));
        assert_eq!(rows[2]["units"], json!(7));
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = RelationshipSummary::from_relationships(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_confidence, None);
    }
}
