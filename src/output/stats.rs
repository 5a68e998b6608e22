//! Crawl statistics
//!
//! Counters collected by the coordinator while the crawl runs, logged when it
//! finishes and returned to the caller.

use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Success records emitted
    pub pages_succeeded: u64,

    /// Error records emitted (fetch failures and robots denials)
    pub pages_failed: u64,

    /// Error records caused by robots.txt
    pub robots_denied: u64,

    /// Anchors scanned across all pages
    pub links_seen: u64,

    /// Links that won the visited-set check and were queued
    pub links_admitted: u64,

    /// Links rejected because they were already visited
    pub duplicate_links: u64,

    /// Links that could not be resolved
    pub malformed_links: u64,

    /// Links outside the host scope
    pub out_of_scope_links: u64,

    /// Links matching an exclusion substring
    pub excluded_links: u64,

    /// Links with a scheme other than http or https
    pub unsupported_links: u64,

    /// Pages at max depth whose links were not followed
    pub depth_truncated_pages: u64,

    /// Pages whose content extraction failed
    pub extraction_failures: u64,

    /// In-flight fetches abandoned after a stop signal
    pub abandoned: u64,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStats {
    /// Total records emitted
    pub fn records(&self) -> u64 {
        self.pages_succeeded + self.pages_failed
    }

    /// Percentage of records that were successes
    pub fn success_rate(&self) -> f64 {
        let total = self.records();
        if total == 0 {
            0.0
        } else {
            self.pages_succeeded as f64 / total as f64 * 100.0
        }
    }

    /// Pages completed per second of wall-clock time
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records() as f64 / secs
        } else {
            0.0
        }
    }

    /// Writes the summary to the log
    pub fn log_summary(&self) {
        tracing::info!(
            "Crawl finished: {} records ({} ok, {} failed, {:.1}% success) in {:?}",
            self.records(),
            self.pages_succeeded,
            self.pages_failed,
            self.success_rate(),
            self.elapsed
        );
        tracing::info!(
            "Links: {} seen, {} admitted, {} duplicate, {} out of scope, {} excluded, {} unsupported, {} malformed",
            self.links_seen,
            self.links_admitted,
            self.duplicate_links,
            self.out_of_scope_links,
            self.excluded_links,
            self.unsupported_links,
            self.malformed_links
        );
        if self.robots_denied > 0 {
            tracing::info!("Forbidden by robots.txt: {}", self.robots_denied);
        }
        if self.extraction_failures > 0 {
            tracing::warn!("Content extraction failed on {} pages", self.extraction_failures);
        }
        if self.abandoned > 0 {
            tracing::warn!("{} in-flight fetches abandoned at shutdown", self.abandoned);
        }
    }
}
