use serde::Deserialize;
use std::time::Duration;

/// User agent sent with every request unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Path substrings that exclude a link from the crawl
pub const DEFAULT_EXCLUSIONS: &[&str] = &["/it", "/fr"];

/// HTML tags whose text is extracted into `page_content`
pub const DEFAULT_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "a", "li", "ul", "ol", "table", "tr", "td", "th",
    "div", "span",
];

/// Immutable configuration snapshot for one crawl run
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Start URLs, crawled at depth 0 in the given order
    pub seeds: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum number of link hops from a seed
    pub max_depth: u32,

    /// Maximum simultaneous in-flight fetches per host
    pub per_host_concurrency: u32,

    /// Maximum simultaneous in-flight fetches overall
    pub global_concurrency: u32,

    /// Minimum time between two dispatches to the same host (milliseconds)
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Grace period for in-flight fetches after a stop signal (seconds)
    pub drain_timeout_secs: u64,

    /// Whether robots.txt is consulted before each fetch
    pub respect_robots: bool,

    /// User agent sent with page and robots.txt requests
    pub user_agent: String,

    /// Links whose absolute form contains any of these are never followed
    pub path_exclusions: Vec<String>,

    /// Overrides the per-page host scope with a fixed host substring
    pub host_scope: Option<String>,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            per_host_concurrency: 8,
            global_concurrency: 16,
            request_delay_ms: 2000,
            request_timeout_secs: 180,
            drain_timeout_secs: 30,
            respect_robots: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            path_exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            host_scope: None,
        }
    }
}

/// Content extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractionConfig {
    /// Whether records carry a `page_content` field
    pub enabled: bool,

    /// Tag allowlist passed to the extractor
    pub tags: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tags: DEFAULT_TAGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// JSON Lines file, truncated at crawl start
    pub path: String,

    /// Records buffered between the crawl loop and the writer
    pub channel_capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "output.jsonl".to_string(),
            channel_capacity: 64,
        }
    }
}

impl CrawlConfig {
    /// Builds a configuration with default settings for the given seeds
    pub fn with_seeds<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seeds: seeds.into_iter().map(Into::into).collect(),
            crawler: CrawlerConfig::default(),
            extraction: ExtractionConfig::default(),
            output: OutputConfig::default(),
        }
    }
}
