//! CSV Connector - parses CSV text into a dataset

use crate::dataset::{Dataset, Row};
use crate::error::{RelateError, Result};
use crate::ingestion::connector::DatasetSource;
use crate::scheduler::Yielder;
use csv::{Reader, ReaderBuilder, StringRecord};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// CSV Connector - wraps CSV text and converts it into typed row-records.
pub struct CsvConnector {
    source_id: String,
    csv_text: String,
}

impl CsvConnector {
    pub fn new(source_id: impl Into<String>, csv_text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            csv_text: csv_text.into(),
        }
    }

    /// Read a CSV file; the file stem becomes the source id
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let csv_text = std::fs::read_to_string(path)?;
        Ok(Self::new(super::dataset_name(path), csv_text))
    }

    fn coerce_cell(s: &str) -> Value {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Number(i.into());
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return Value::Number(n);
            }
        }

        Value::String(trimmed.to_string())
    }

    fn reader(&self) -> Reader<&[u8]> {
        ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(self.csv_text.as_bytes())
    }

    /// Trimmed header names; blanks get positional names and repeats get a numeric suffix
    fn headers(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
        let raw = reader
            .headers()
            .map_err(|e| RelateError::Ingestion(format!("Failed to read CSV headers: {}", e)))?;

        let names: Vec<String> = raw
            .iter()
            .enumerate()
            .map(|(idx, header)| match header.trim() {
                "" => format!("column_{}", idx + 1),
                name => name.to_string(),
            })
            .collect();

        // Suffixes skip names that appear anywhere in the header row
        let mut taken: HashSet<String> = names.iter().cloned().collect();
        let mut emitted: HashSet<String> = HashSet::new();
        let mut next_suffix: HashMap<String, usize> = HashMap::new();
        let mut headers = Vec::with_capacity(names.len());
        for base in names {
            if emitted.insert(base.clone()) {
                headers.push(base);
                continue;
            }

            let suffix = next_suffix.entry(base.clone()).or_insert(2);
            let mut candidate = format!("{}_{}", base, suffix);
            while taken.contains(&candidate) {
                *suffix += 1;
                candidate = format!("{}_{}", base, suffix);
            }
            *suffix += 1;

            taken.insert(candidate.clone());
            emitted.insert(candidate.clone());
            headers.push(candidate);
        }
        Ok(headers)
    }

    fn to_row(headers: &[String], record: &StringRecord) -> Row {
        let mut row = Row::new();
        for (idx, header) in headers.iter().enumerate() {
            let cell = record.get(idx).unwrap_or("");
            row.insert(header.clone(), Self::coerce_cell(cell));
        }
        row
    }

    /// Parse in chunks of `chunk_size` records, yielding to the host between chunks
    pub async fn load_cooperative(
        &self,
        yielder: &dyn Yielder,
        chunk_size: usize,
    ) -> Result<Dataset> {
        let chunk_size = chunk_size.max(1);
        let mut reader = self.reader();
        let headers = Self::headers(&mut reader)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(Self::to_row(&headers, &record));
            if rows.len() % chunk_size == 0 {
                yielder.yield_point().await;
            }
        }

        debug!(source = %self.source_id, rows = rows.len(), "parsed CSV in chunks");
        Ok(Dataset::new(self.source_id.clone(), headers, rows))
    }
}

impl DatasetSource for CsvConnector {
    fn load(&self) -> Result<Dataset> {
        let mut reader = self.reader();
        let headers = Self::headers(&mut reader)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(Self::to_row(&headers, &record));
        }

        debug!(source = %self.source_id, rows = rows.len(), columns = headers.len(), "parsed CSV");
        Ok(Dataset::new(self.source_id.clone(), headers, rows))
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn source_type(&self) -> &str {
        "csv"
    }
}
