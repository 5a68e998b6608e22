//! Output module for crawl records and statistics
//!
//! This module handles:
//! - The page record shapes written for every completed work item
//! - Sinks that persist records (JSON Lines file, in-memory)
//! - The bounded emitter between the crawl loop and a sink
//! - Crawl statistics

mod emitter;
mod record;
mod sink;
pub mod stats;
mod traits;

pub use emitter::RecordEmitter;
pub use record::PageRecord;
pub use sink::{JsonLinesSink, MemorySink};
pub use stats::CrawlStats;
pub use traits::{OutputError, OutputResult, RecordSink};
