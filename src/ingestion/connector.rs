//! Dataset source trait - abstract interface for anything that yields a dataset

use crate::dataset::Dataset;
use crate::error::Result;

/// Dataset source
///
/// Implementations:
/// - CsvConnector: CSV text (uploads, files read into memory)
/// - FileConnector: CSV / Parquet files via polars
pub trait DatasetSource: Send + Sync {
    /// Parse the source into a dataset with a fresh id
    fn load(&self) -> Result<Dataset>;

    /// Source ID, used as the dataset name
    fn source_id(&self) -> &str;

    /// Source type (e.g., "csv", "parquet")
    fn source_type(&self) -> &str;
}
