//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Following redirects hop by hop (up to 10), each target going through
//!   the visited set and the robots policy like any discovered link
//! - Classifying failures into a `FetchError` whose message becomes the
//!   error record's reason

use crate::config::CrawlerConfig;
use crate::crawler::scheduler::WorkItem;
use crate::crawler::visited::VisitedSet;
use crate::robots::RobotsPolicy;
use crate::url::resolve;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for a single fetch
pub const MAX_REDIRECTS: usize = 10;

/// Why a fetch produced no page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP {code} {reason}")]
    Status { code: u16, reason: String },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Forbidden by robots.txt")]
    RobotsDenied,

    #[error("Redirected to already visited URL")]
    RedirectVisited,

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Invalid redirect: {0}")]
    InvalidRedirect(String),
}

impl FetchError {
    /// Classifies a transport error from reqwest
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// A successfully fetched response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status_code: u16,

    /// Decoded response body
    pub body: String,
}

/// What a single request returned
#[derive(Debug, Clone)]
pub enum FetchedResponse {
    /// A 2xx response
    Page(FetchedPage),

    /// A 3xx response; `location` is the raw header value
    Redirect { status_code: u16, location: String },
}

/// Performs a single network request without following redirects
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, FetchError>;
}

/// Builds an HTTP client with the crawl's identity and limits
///
/// # Arguments
///
/// * `user_agent` - Value sent in the `User-Agent` header
/// * `timeout` - Total time allowed for one request
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use webcrawler::crawler::build_http_client;
///
/// let client = build_http_client("Mozilla/5.0", Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(30)))
        .redirect(Policy::none()) // followed in fetch_item
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher from the crawler settings
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.request_timeout())?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client, shared with the robots cache
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();

        if status.is_redirection() {
            if let Some(location) = response.headers().get(reqwest::header::LOCATION) {
                let location = location
                    .to_str()
                    .map_err(|e| FetchError::InvalidRedirect(e.to_string()))?;
                return Ok(FetchedResponse::Redirect {
                    status_code: status.as_u16(),
                    location: location.to_string(),
                });
            }
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(FetchedResponse::Page(FetchedPage {
            status_code: status.as_u16(),
            body,
        }))
    }
}

/// A page ready for processing
#[derive(Debug, Clone)]
pub struct PageFetch {
    /// Canonical URL of the work item
    pub url: Url,

    /// URL after redirects, used as the base for links
    pub final_url: Url,

    /// Depth of the work item
    pub depth: u32,

    /// HTTP status code
    pub status_code: u16,

    /// Raw response body
    pub body: String,
}

/// Outcome of fetching one work item
#[derive(Debug)]
pub enum FetchResult {
    /// The page was fetched
    Success(PageFetch),

    /// No page; the item becomes a dead end
    Failure { url: Url, reason: FetchError },
}

/// Fetches a work item, following redirects, and packages the outcome
///
/// Each redirect target is canonicalized and must win `visited.try_mark`
/// before it is requested, so a chain never reaches a URL that this crawl
/// has already fetched or queued. Targets are also checked against
/// `robots`. The result always carries the item's own URL.
pub async fn fetch_item(
    fetcher: &dyn Fetcher,
    robots: &dyn RobotsPolicy,
    visited: &VisitedSet,
    item: &WorkItem,
) -> FetchResult {
    match follow_redirects(fetcher, robots, visited, item).await {
        Ok((final_url, page)) => FetchResult::Success(PageFetch {
            url: item.url.clone(),
            final_url,
            depth: item.depth,
            status_code: page.status_code,
            body: page.body,
        }),
        Err(reason) => {
            tracing::warn!("Failed to fetch {}: {}", item.url, reason);
            FetchResult::Failure {
                url: item.url.clone(),
                reason,
            }
        }
    }
}

async fn follow_redirects(
    fetcher: &dyn Fetcher,
    robots: &dyn RobotsPolicy,
    visited: &VisitedSet,
    item: &WorkItem,
) -> Result<(Url, FetchedPage), FetchError> {
    let mut current = item.url.clone();
    let mut hops = 0;

    loop {
        let location = match fetcher.fetch(&current).await? {
            FetchedResponse::Page(page) => return Ok((current, page)),
            FetchedResponse::Redirect { location, .. } => location,
        };
        if hops == MAX_REDIRECTS {
            return Err(FetchError::TooManyRedirects);
        }
        hops += 1;

        let target = resolve(&current, &location)
            .map_err(|e| FetchError::InvalidRedirect(e.to_string()))?;
        if !visited.try_mark(target.as_str()) {
            tracing::debug!("{} redirected to already visited {}", current, target);
            return Err(FetchError::RedirectVisited);
        }
        if !robots.is_allowed(&target).await {
            return Err(FetchError::RobotsDenied);
        }

        tracing::debug!("{} redirected to {}", current, target);
        current = target;
    }
}
