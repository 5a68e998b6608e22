//! Record sink implementations

use crate::output::traits::{OutputResult, RecordSink};
use crate::output::PageRecord;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Writes records as newline-delimited UTF-8 JSON
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the output file
    pub async fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(path).await?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn write(&mut self, record: &PageRecord) -> OutputResult<()> {
        let mut line = record.to_json_line()?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// Collects records in memory
///
/// Cloning the sink shares the underlying buffer, so a clone kept by the
/// caller can read what the crawl wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<PageRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record written so far
    pub fn records(&self) -> Vec<PageRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&mut self, record: &PageRecord) -> OutputResult<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    async fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
