//! Record emitter: bounded hand-off from the crawl loop to the sink

use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::output::PageRecord;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Forwards records to a sink running on its own task
///
/// The channel between the crawl and the writer is bounded: when the sink
/// falls behind, `emit` waits for room instead of buffering without limit
/// or dropping records.
pub struct RecordEmitter {
    tx: mpsc::Sender<PageRecord>,
    writer: JoinHandle<OutputResult<u64>>,
}

impl RecordEmitter {
    /// Starts the writer task
    ///
    /// # Arguments
    ///
    /// * `sink` - Destination for records
    /// * `capacity` - Records buffered before `emit` blocks (minimum 1)
    pub fn spawn(mut sink: Box<dyn RecordSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<PageRecord>(capacity.max(1));

        let writer = tokio::spawn(async move {
            let mut written = 0u64;
            while let Some(record) = rx.recv().await {
                if let Err(e) = sink.write(&record).await {
                    tracing::error!("Failed to write record for {}: {}", record.url(), e);
                    return Err(e);
                }
                written += 1;
            }
            sink.flush().await?;
            Ok(written)
        });

        Self { tx, writer }
    }

    /// Sends one record to the sink, waiting while the buffer is full
    pub async fn emit(&self, record: PageRecord) -> OutputResult<()> {
        self.tx.send(record).await.map_err(|_| OutputError::Closed)
    }

    /// Closes the stream, waits for the writer and returns the record count
    ///
    /// A sink failure that closed the stream early is reported here.
    pub async fn finish(self) -> OutputResult<u64> {
        drop(self.tx);
        self.writer
            .await
            .map_err(|e| OutputError::Write(format!("writer task failed: {}", e)))?
    }
}
