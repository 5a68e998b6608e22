//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The visited set that deduplicates every enqueue
//! - Frontier scheduling with per-host politeness
//! - HTTP fetching and failure classification
//! - Content extraction and link discovery
//! - Overall crawl coordination

mod coordinator;
mod extract;
mod fetcher;
mod processor;
mod scheduler;
mod visited;

pub use coordinator::{run_crawl, Coordinator};
pub use extract::{ContentExtractor, ExtractError, TagTextExtractor};
pub use fetcher::{
    build_http_client, fetch_item, FetchError, FetchResult, FetchedPage, FetchedResponse, Fetcher,
    HttpFetcher, PageFetch, MAX_REDIRECTS,
};
pub use processor::{extract_hrefs, LinkStats, PageProcessor, ProcessedPage};
pub use scheduler::{NextDispatch, ScheduledFetch, Scheduler, WorkItem};
pub use visited::VisitedSet;

use crate::config::CrawlConfig;
use crate::output::CrawlStats;
use crate::CrawlError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl, stopping early if `cancel` fires
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and robots.txt cache
/// 2. Truncate the output file
/// 3. Seed the frontier and dispatch fetches under per-host limits
/// 4. Extract content and follow same-host links up to the depth limit
/// 5. Emit one record per visited URL and return the statistics
pub async fn crawl(config: CrawlConfig, cancel: CancellationToken) -> Result<CrawlStats, CrawlError> {
    run_crawl(config, cancel).await
}
