//! Output sink trait and error types
//!
//! A sink is the append-only destination for page records. The crawl never
//! talks to a sink directly; records flow through the
//! [`RecordEmitter`](crate::output::RecordEmitter).

use crate::output::PageRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record channel closed")]
    Closed,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for page records
#[async_trait]
pub trait RecordSink: Send {
    /// Appends one record
    async fn write(&mut self, record: &PageRecord) -> OutputResult<()>;

    /// Flushes buffered records to the underlying medium
    async fn flush(&mut self) -> OutputResult<()>;
}
