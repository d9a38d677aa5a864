//! JSON-lines lineage log.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use irma_core::{LineagePersistence, LineageRecord};
use tracing::warn;

/// Appends one JSON object per birth; the first write failure disables the sink.
#[derive(Debug)]
pub struct JsonLinesLineage {
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl JsonLinesLineage {
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open lineage log {}", path.display()))?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            written: 0,
        })
    }

    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    fn write(&mut self, record: &LineageRecord) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl LineagePersistence for JsonLinesLineage {
    fn on_birth(&mut self, record: &LineageRecord) {
        if let Err(err) = self.write(record) {
            warn!(id = %record.id, error = %err, "lineage log disabled after write failure");
            self.writer = None;
        }
    }
}

impl Drop for JsonLinesLineage {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!(error = %err, "failed to flush lineage log");
        }
    }
}
