//! Ingestion - turns files and CSV text into `Dataset`s
//!
//! Parsing sits outside the relationship engine; these adapters are what the
//! command line and tests feed it with:
//! - `CsvConnector`: CSV text with per-cell type coercion
//! - `FileConnector`: CSV or Parquet files read through polars

pub mod connector;
pub mod csv_connector;
pub mod polars_loader;

pub use connector::DatasetSource;
pub use csv_connector::CsvConnector;
pub use polars_loader::{dataframe_to_dataset, FileConnector, FileFormat};

use crate::dataset::Dataset;
use crate::error::Result;
use std::path::Path;

/// Load a dataset from `path`, choosing the reader from the file extension.
/// CSV goes through `CsvConnector` so coercion matches in-memory uploads.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    match FileFormat::from_path(path)? {
        FileFormat::Csv => CsvConnector::from_path(path)?.load(),
        FileFormat::Parquet => FileConnector::new(path, FileFormat::Parquet).load(),
    }
}

/// Dataset name for a file: its stem, or the whole path when there is none
pub(crate) fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
