pub mod builder;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod error;
pub mod ingestion;
pub mod join_engine;
pub mod profiler;
pub mod sampling;
pub mod scheduler;
pub mod similarity;
pub mod workspace;

pub use builder::{all_relationships, detect_relationships, RelationshipSetBuilder};
pub use config::RelateConfig;
pub use dataset::{
    normalize_value, CellValue, Dataset, DatasetId, Relationship, RelationshipType, Row,
};
pub use detector::{ColumnKeys, DetectorConfig, RelationshipDetector};
pub use error::{RelateError, Result};
pub use ingestion::{load_dataset, CsvConnector, DatasetSource, FileConnector, FileFormat};
pub use join_engine::{join_datasets, ChainMode, JoinEngine, JoinReport};
pub use profiler::{ColumnProfile, ColumnProfiler, ProfilerConfig, SemanticType};
pub use sampling::{SampleSize, Sampler, SamplingStrategy};
pub use scheduler::{
    detect_relationships_cooperative, detect_relationships_parallel, CancellationFlag, NoYield,
    TokioYield, Yielder,
};
pub use similarity::{name_similarity, similarity};
pub use workspace::{RelationshipSummary, Workspace};
