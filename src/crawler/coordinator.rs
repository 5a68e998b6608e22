//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the scheduler and runs the crawl loop:
//! - Seeds the frontier
//! - Dispatches ready items to fetch workers on a `JoinSet`
//! - Emits each worker's record, completes the item and admits its children
//! - Stops dispatching on cancellation and drains in-flight work
//!
//! robots.txt is consulted when a URL is admitted, not when it is dispatched,
//! so a disallowed URL gets its error record without taking a host slot or
//! a politeness window.

use crate::config::CrawlConfig;
use crate::crawler::extract::{ContentExtractor, TagTextExtractor};
use crate::crawler::fetcher::{fetch_item, FetchError, FetchResult, Fetcher, HttpFetcher};
use crate::crawler::processor::{LinkStats, PageProcessor};
use crate::crawler::scheduler::{NextDispatch, ScheduledFetch, Scheduler, WorkItem};
use crate::crawler::visited::VisitedSet;
use crate::output::{CrawlStats, JsonLinesSink, OutputError, PageRecord, RecordEmitter, RecordSink};
use crate::robots::{AllowAll, RobotsCache, RobotsPolicy};
use crate::state::HostPolicy;
use crate::url::canonicalize;
use crate::CrawlError;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How often the loop wakes when nothing is in flight and no host is timed
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Completed pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Everything a fetch worker needs, shared across tasks
struct WorkerContext {
    fetcher: Arc<dyn Fetcher>,
    robots: Arc<dyn RobotsPolicy>,
    processor: PageProcessor,
    visited: Arc<VisitedSet>,
}

/// What a worker hands back for one dispatched item
struct WorkerOutcome {
    url: String,
    host: String,
    record: PageRecord,
    /// Children that already won the visited-set check
    children: Vec<WorkItem>,
    /// Children that won the visited-set check but robots.txt disallows
    denied: Vec<Url>,
    links: LinkStats,
    duplicates: u64,
    robots_denied: bool,
}

impl WorkerOutcome {
    fn failed(item: &WorkItem, host: String, reason: &FetchError) -> Self {
        Self {
            url: item.url.as_str().to_string(),
            host,
            record: PageRecord::error(item.url.as_str(), reason.to_string()),
            children: Vec::new(),
            denied: Vec::new(),
            links: LinkStats::default(),
            duplicates: 0,
            robots_denied: matches!(reason, FetchError::RobotsDenied),
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<CrawlConfig>,
    context: Arc<WorkerContext>,
    sink: Box<dyn RecordSink>,
}

impl Coordinator {
    /// Creates a coordinator wired to HTTP, robots.txt and the JSON Lines file
    ///
    /// The output file is created (or truncated) here.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - The HTTP client or output file could not be set up
    pub async fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let http = HttpFetcher::new(&config.crawler)?;

        let robots: Arc<dyn RobotsPolicy> = if config.crawler.respect_robots {
            Arc::new(RobotsCache::new(
                http.client().clone(),
                &config.crawler.user_agent,
            ))
        } else {
            tracing::info!("robots.txt checks disabled");
            Arc::new(AllowAll)
        };

        let extractor: Option<Arc<dyn ContentExtractor>> = if config.extraction.enabled {
            Some(Arc::new(TagTextExtractor))
        } else {
            None
        };

        let sink = JsonLinesSink::create(Path::new(&config.output.path)).await?;

        Ok(Self::with_collaborators(
            config,
            Arc::new(http),
            robots,
            extractor,
            Box::new(sink),
        ))
    }

    /// Creates a coordinator with explicit collaborators
    pub fn with_collaborators(
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        robots: Arc<dyn RobotsPolicy>,
        extractor: Option<Arc<dyn ContentExtractor>>,
        sink: Box<dyn RecordSink>,
    ) -> Self {
        let processor = PageProcessor::new(&config, extractor);
        let context = WorkerContext {
            fetcher,
            robots,
            processor,
            visited: Arc::new(VisitedSet::new()),
        };

        Self {
            config: Arc::new(config),
            context: Arc::new(context),
            sink,
        }
    }

    /// Runs the crawl to completion or until `cancel` fires
    ///
    /// Per-page failures become error records and never end the crawl. An
    /// `Err` means the output stream broke or an internal task panicked.
    pub async fn run(self, cancel: CancellationToken) -> Result<CrawlStats, CrawlError> {
        let Self {
            config,
            context,
            sink,
        } = self;

        let start = Instant::now();
        let mut stats = CrawlStats::default();
        let emitter = RecordEmitter::spawn(sink, config.output.channel_capacity);

        let policy = HostPolicy {
            max_in_flight: config.crawler.per_host_concurrency,
            min_delay: config.crawler.request_delay(),
        };
        let mut scheduler = Scheduler::new(policy, config.crawler.global_concurrency as usize);

        for seed in &config.seeds {
            let url = canonicalize(seed)?;
            if !context.visited.try_mark(url.as_str()) {
                tracing::debug!("Duplicate seed {}", url);
                continue;
            }
            if context.robots.is_allowed(&url).await {
                scheduler.admit(WorkItem::new(url, 0))?;
            } else if let Err(e) = emit_denied(url, &emitter, &mut stats).await {
                return Err(sink_failure(emitter, e).await);
            }
        }

        tracing::info!(
            "Starting crawl: {} seeds, max depth {}, {} per host, {:?} between requests",
            scheduler.frontier_size(),
            config.crawler.max_depth,
            config.crawler.per_host_concurrency,
            config.crawler.request_delay()
        );

        let mut tasks: JoinSet<WorkerOutcome> = JoinSet::new();
        let mut stopped = false;

        loop {
            if cancel.is_cancelled() {
                stopped = true;
                break;
            }

            let mut wait = None;
            loop {
                match scheduler.poll_dispatch(Instant::now()) {
                    NextDispatch::Ready(fetch) => {
                        tasks.spawn(run_worker(fetch, Arc::clone(&context)));
                    }
                    NextDispatch::Wait(delay) => {
                        wait = Some(delay);
                        break;
                    }
                    NextDispatch::Blocked | NextDispatch::Empty => break,
                }
            }

            if tasks.is_empty() && scheduler.is_drained() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    stopped = true;
                    break;
                }
                Some(joined) = tasks.join_next() => {
                    let outcome = joined?;
                    if let Err(e) = complete_item(outcome, &mut scheduler, &emitter, &mut stats).await {
                        tasks.abort_all();
                        return Err(sink_failure(emitter, e).await);
                    }
                    if stats.records() % PROGRESS_INTERVAL == 0 {
                        log_progress(&stats, &scheduler, start);
                    }
                }
                _ = tokio::time::sleep(wait.unwrap_or(IDLE_POLL)), if wait.is_some() || tasks.is_empty() => {
                    tracing::trace!("Woke for politeness window");
                }
            }
        }

        if stopped {
            tracing::info!(
                "Stop requested: {} fetches in flight, {} items not dispatched",
                tasks.len(),
                scheduler.frontier_size()
            );
            let drain = tokio::time::sleep(config.crawler.drain_timeout());
            tokio::pin!(drain);

            while !tasks.is_empty() {
                tokio::select! {
                    _ = &mut drain => {
                        stats.abandoned = tasks.len() as u64;
                        tracing::warn!("Drain timeout reached, abandoning {} fetches", tasks.len());
                        tasks.shutdown().await;
                        break;
                    }
                    Some(joined) = tasks.join_next() => {
                        let outcome = joined?;
                        if let Err(e) = complete_item(outcome, &mut scheduler, &emitter, &mut stats).await {
                            tasks.abort_all();
                            return Err(sink_failure(emitter, e).await);
                        }
                    }
                }
            }
        }

        let written = emitter.finish().await?;
        stats.elapsed = start.elapsed();
        tracing::debug!(
            "{} records written, {} URLs visited",
            written,
            context.visited.len()
        );
        stats.log_summary();

        Ok(stats)
    }
}

/// Fetches and processes one item
///
/// Children are admitted through the visited set here, so concurrent workers
/// discovering the same URL resolve to a single winner. Each winner is then
/// checked against robots.txt.
async fn run_worker(fetch: ScheduledFetch, context: Arc<WorkerContext>) -> WorkerOutcome {
    let ScheduledFetch {
        item,
        host,
        _permit,
    } = fetch;

    let fetched = fetch_item(
        context.fetcher.as_ref(),
        context.robots.as_ref(),
        &context.visited,
        &item,
    )
    .await;
    let page = match fetched {
        FetchResult::Success(page) => page,
        FetchResult::Failure { reason, .. } => {
            return WorkerOutcome::failed(&item, host, &reason);
        }
    };

    let processed = context.processor.process(page);

    let mut children = Vec::with_capacity(processed.candidates.len());
    let mut denied = Vec::new();
    let mut duplicates = 0;
    for candidate in processed.candidates {
        if !context.visited.try_mark(candidate.url.as_str()) {
            duplicates += 1;
            continue;
        }
        if context.robots.is_allowed(&candidate.url).await {
            tracing::debug!("Discovered {} at depth {}", candidate.url, candidate.depth);
            children.push(candidate);
        } else {
            denied.push(candidate.url);
        }
    }

    WorkerOutcome {
        url: item.url.as_str().to_string(),
        host,
        record: processed.record,
        children,
        denied,
        links: processed.stats,
        duplicates,
        robots_denied: false,
    }
}

/// Emits the error record for a URL that robots.txt disallows
async fn emit_denied(
    url: Url,
    emitter: &RecordEmitter,
    stats: &mut CrawlStats,
) -> Result<(), OutputError> {
    tracing::info!("URL {} disallowed by robots.txt", url);
    stats.pages_failed += 1;
    stats.robots_denied += 1;
    emitter
        .emit(PageRecord::error(url.as_str(), FetchError::RobotsDenied.to_string()))
        .await
}

/// Emits the record, completes the item and admits its children
///
/// Records for disallowed children follow the item's own record.
async fn complete_item(
    outcome: WorkerOutcome,
    scheduler: &mut Scheduler,
    emitter: &RecordEmitter,
    stats: &mut CrawlStats,
) -> Result<(), OutputError> {
    let WorkerOutcome {
        url,
        host,
        record,
        children,
        denied,
        links,
        duplicates,
        robots_denied,
    } = outcome;

    if record.is_success() {
        stats.pages_succeeded += 1;
    } else {
        stats.pages_failed += 1;
    }
    if robots_denied {
        stats.robots_denied += 1;
    }
    stats.links_seen += links.anchors;
    stats.malformed_links += links.malformed;
    stats.out_of_scope_links += links.out_of_scope;
    stats.excluded_links += links.excluded;
    stats.unsupported_links += links.unsupported;
    stats.duplicate_links += duplicates;
    stats.links_admitted += children.len() as u64;
    if links.depth_truncated {
        stats.depth_truncated_pages += 1;
    }
    if links.extraction_failed {
        stats.extraction_failures += 1;
    }

    emitter.emit(record).await?;
    for url in denied {
        emit_denied(url, emitter, stats).await?;
    }

    if let Err(e) = scheduler.complete(&url, &host) {
        tracing::error!("{}", e);
    }
    for child in children {
        if let Err(e) = scheduler.admit(child) {
            tracing::error!("{}", e);
        }
    }

    Ok(())
}

/// Resolves the error to report when emitting a record failed
///
/// A closed channel means the writer task stopped; its own error is the
/// more useful one.
async fn sink_failure(emitter: RecordEmitter, emit_error: OutputError) -> CrawlError {
    match emitter.finish().await {
        Err(e) => {
            tracing::error!("Output sink failed: {}", e);
            e.into()
        }
        Ok(_) => emit_error.into(),
    }
}

fn log_progress(stats: &CrawlStats, scheduler: &Scheduler, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 {
        stats.records() as f64 / elapsed
    } else {
        0.0
    };
    tracing::info!(
        "Progress: {} pages crawled, {} in frontier, {} in flight, {:.2} pages/sec",
        stats.records(),
        scheduler.frontier_size(),
        scheduler.in_flight(),
        rate
    );
}

/// Runs a complete crawl over HTTP with output to the configured file
///
/// # Example
///
/// ```no_run
/// use webcrawler::config::load_config;
/// use webcrawler::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let stats = run_crawl(config, CancellationToken::new()).await?;
/// println!("{} pages", stats.records());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: CrawlConfig,
    cancel: CancellationToken,
) -> Result<CrawlStats, CrawlError> {
    let coordinator = Coordinator::new(config).await?;
    coordinator.run(cancel).await
}
