//! Page processing: content extraction and link discovery
//!
//! Turns a fetched page into its success record and the candidate work items
//! found in its anchors. Candidates still have to win the visited-set check
//! before they are admitted.

use crate::config::CrawlConfig;
use crate::crawler::extract::ContentExtractor;
use crate::crawler::fetcher::PageFetch;
use crate::crawler::scheduler::WorkItem;
use crate::output::PageRecord;
use crate::url::{classify_link, netloc, LinkDecision};
use scraper::{Html, Selector};
use std::sync::Arc;
use url::Url;

/// Link filter counts for one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub anchors: u64,
    pub malformed: u64,
    pub out_of_scope: u64,
    pub excluded: u64,
    pub unsupported: u64,
    /// The page sits at max depth and its links were not followed
    pub depth_truncated: bool,
    /// Content extraction failed and `page_content` was omitted
    pub extraction_failed: bool,
}

/// Output of processing one page
#[derive(Debug)]
pub struct ProcessedPage {
    /// The success record for the page
    pub record: PageRecord,

    /// Accepted links at `depth + 1`, in document order
    pub candidates: Vec<WorkItem>,

    /// Link filter counts
    pub stats: LinkStats,
}

/// Extracts content and candidate links from fetched pages
pub struct PageProcessor {
    extractor: Option<Arc<dyn ContentExtractor>>,
    tags: Vec<String>,
    exclusions: Vec<String>,
    host_scope: Option<String>,
    max_depth: u32,
}

impl PageProcessor {
    /// Creates a processor
    ///
    /// Passing `None` for `extractor` produces records without `page_content`.
    pub fn new(config: &CrawlConfig, extractor: Option<Arc<dyn ContentExtractor>>) -> Self {
        Self {
            extractor,
            tags: config.extraction.tags.clone(),
            exclusions: config.crawler.path_exclusions.clone(),
            host_scope: config.crawler.host_scope.clone(),
            max_depth: config.crawler.max_depth,
        }
    }

    /// Processes a fetched page
    pub fn process(&self, page: PageFetch) -> ProcessedPage {
        let mut stats = LinkStats::default();

        let page_content = self.extract_content(&page, &mut stats);

        let candidates = if page.depth >= self.max_depth {
            tracing::debug!(
                "{} is at max depth {}, not following links",
                page.url,
                self.max_depth
            );
            stats.depth_truncated = true;
            Vec::new()
        } else {
            self.discover_links(&page, &mut stats)
        };

        ProcessedPage {
            record: PageRecord::success(page.url.as_str(), page.body, page_content),
            candidates,
            stats,
        }
    }

    fn extract_content(&self, page: &PageFetch, stats: &mut LinkStats) -> Option<String> {
        let extractor = self.extractor.as_ref()?;
        match extractor.extract(&page.body, &self.tags) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Content extraction failed for {}: {}", page.url, e);
                stats.extraction_failed = true;
                None
            }
        }
    }

    /// Scope for links found on `base`: the configured override or the page's netloc
    fn scope_for<'a>(&'a self, base: &'a Url) -> &'a str {
        self.host_scope
            .as_deref()
            .or_else(|| netloc(base))
            .unwrap_or_default()
    }

    fn discover_links(&self, page: &PageFetch, stats: &mut LinkStats) -> Vec<WorkItem> {
        let base = &page.final_url;
        let scope = self.scope_for(base);
        let child_depth = page.depth + 1;

        let mut candidates = Vec::new();
        for href in extract_hrefs(&page.body) {
            stats.anchors += 1;
            match classify_link(base, &href, scope, &self.exclusions) {
                LinkDecision::Accepted(url) => {
                    candidates.push(WorkItem::new(url, child_depth));
                }
                LinkDecision::OutOfScope(url) => {
                    tracing::debug!("Skipping out-of-scope link {}", url);
                    stats.out_of_scope += 1;
                }
                LinkDecision::Excluded(url) => {
                    tracing::debug!("Skipping excluded link {}", url);
                    stats.excluded += 1;
                }
                LinkDecision::Unsupported(scheme) => {
                    tracing::trace!("Skipping {} link {}", scheme, href);
                    stats.unsupported += 1;
                }
                LinkDecision::Malformed(e) => {
                    tracing::error!("Error processing URL {}: {}", href, e);
                    stats.malformed += 1;
                }
            }
        }
        candidates
    }
}

/// Returns every anchor href in document order
///
/// Empty and fragment-only hrefs point back at the same page and are skipped.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .map(str::to_string)
        .collect()
}
