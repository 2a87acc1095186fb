//! File Connector - CSV and Parquet files read through polars

use crate::dataset::{Dataset, Row};
use crate::error::{RelateError, Result};
use crate::ingestion::connector::DatasetSource;
use polars::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" => Ok(FileFormat::Csv),
            "parquet" | "pq" => Ok(FileFormat::Parquet),
            _ => Err(RelateError::Ingestion(format!(
                "Unsupported file type for {}: expected .csv or .parquet",
                path.display()
            ))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Parquet => "parquet",
        }
    }
}

/// File Connector - loads a whole file into memory as a dataset
pub struct FileConnector {
    source_id: String,
    path: PathBuf,
    format: FileFormat,
}

impl FileConnector {
    pub fn new(path: impl AsRef<Path>, format: FileFormat) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            source_id: super::dataset_name(&path),
            path,
            format,
        }
    }

    pub fn read_dataframe(&self) -> Result<DataFrame> {
        if !self.path.exists() {
            return Err(RelateError::Ingestion(format!(
                "File not found: {}",
                self.path.display()
            )));
        }

        let df = match self.format {
            FileFormat::Csv => LazyCsvReader::new(&self.path)
                .with_has_header(true)
                .finish()?
                .collect()?,
            FileFormat::Parquet => {
                LazyFrame::scan_parquet(&self.path, ScanArgsParquet::default())?.collect()?
            }
        };
        Ok(df)
    }
}

impl DatasetSource for FileConnector {
    fn load(&self) -> Result<Dataset> {
        let df = self.read_dataframe()?;
        debug!(path = %self.path.display(), rows = df.height(), "loaded dataframe");
        dataframe_to_dataset(&self.source_id, &df)
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn source_type(&self) -> &str {
        self.format.as_str()
    }
}

/// Convert a polars DataFrame into a dataset, one row-record per frame row
pub fn dataframe_to_dataset(name: &str, df: &DataFrame) -> Result<Dataset> {
    let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let series = columns
        .iter()
        .map(|c| df.column(c))
        .collect::<PolarsResult<Vec<&Series>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let mut row = Row::new();
        for (column, s) in columns.iter().zip(&series) {
            row.insert(column.clone(), any_value_to_cell(s.get(idx)?));
        }
        rows.push(row);
    }

    Ok(Dataset::new(name, columns, rows))
}

fn any_value_to_cell(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_cell(v as f64),
        AnyValue::Float64(v) => float_cell(v),
        other => Value::String(other.to_string()),
    }
}

/// NaN and infinities have no JSON form and read as null
fn float_cell(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
