//! Local durable sink
//!
//! Every run writes one JSON file holding the full ordered array of records,
//! named `{marketplace}_{YYYYMMDDHHMMSS}.json`. The file is the source of
//! truth for a run regardless of webhook delivery.

use crate::record::{CanonicalRecord, Marketplace};
use crate::OutputError;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Result type for local sink operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for the records produced by a run
pub trait RecordSink {
    /// Accepts one record, in output order
    ///
    /// # Arguments
    ///
    /// * `record` - The normalized record
    fn write(&mut self, record: &CanonicalRecord) -> OutputResult<()>;

    /// Completes the output and returns where it was written
    fn finish(&mut self) -> OutputResult<PathBuf>;
}

/// Buffers a run's records and writes them as one pretty-printed JSON array
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    records: Vec<CanonicalRecord>,
}

impl JsonFileSink {
    /// Creates a sink whose file name is stamped with the current UTC time
    pub fn new(directory: impl AsRef<Path>, marketplace: Marketplace) -> Self {
        Self::new_at(directory, marketplace, Utc::now())
    }

    /// Creates a sink whose file name is stamped with `started_at`
    pub fn new_at(
        directory: impl AsRef<Path>,
        marketplace: Marketplace,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            path: directory
                .as_ref()
                .join(output_file_name(marketplace, started_at)),
            records: Vec::new(),
        }
    }

    /// Number of records buffered so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSink for JsonFileSink {
    fn write(&mut self, record: &CanonicalRecord) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<PathBuf> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &self.records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::info!(
            "Saved {} records to {}",
            self.records.len(),
            self.path.display()
        );

        Ok(self.path.clone())
    }
}

/// `{marketplace}_{YYYYMMDDHHMMSS}.json`
pub fn output_file_name(marketplace: Marketplace, started_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.json",
        marketplace.as_str(),
        started_at.format("%Y%m%d%H%M%S")
    )
}
