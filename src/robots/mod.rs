//! Robots.txt handling module
//!
//! The crawl consults a [`RobotsPolicy`] before every fetch. [`RobotsCache`]
//! fetches, parses and caches `robots.txt` once per origin; [`AllowAll`] is
//! used when robots checking is switched off.

mod cache;
mod rules;

pub use cache::CachedRobots;
pub use rules::RobotsRules;

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// Boolean "may this URL be fetched" check
#[async_trait]
pub trait RobotsPolicy: Send + Sync {
    async fn is_allowed(&self, url: &Url) -> bool;
}

/// Policy that allows every URL
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl RobotsPolicy for AllowAll {
    async fn is_allowed(&self, _url: &Url) -> bool {
        true
    }
}

type Slot = Arc<tokio::sync::Mutex<Option<CachedRobots>>>;

/// Per-origin robots.txt cache backed by HTTP
///
/// Each origin gets its own slot, so concurrent checks against one origin
/// wait for a single robots.txt fetch while other origins proceed.
pub struct RobotsCache {
    client: Client,
    user_agent: String,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RobotsCache {
    /// Creates a cache that fetches with `client` and matches rules for `user_agent`
    pub fn new(client: Client, user_agent: &str) -> Self {
        Self {
            client,
            user_agent: product_token(user_agent).to_string(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, origin: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(origin.to_string()).or_default().clone()
    }
}

#[async_trait]
impl RobotsPolicy for RobotsCache {
    async fn is_allowed(&self, url: &Url) -> bool {
        let origin = url.origin().ascii_serialization();
        let slot = self.slot(&origin);
        let mut cached = slot.lock().await;

        let needs_fetch = cached.as_ref().map_or(true, CachedRobots::is_stale);
        if needs_fetch {
            tracing::debug!("Fetching robots.txt for {}", origin);
            let robots = fetch_robots(&self.client, url).await;
            *cached = Some(CachedRobots::new(robots));
        }

        cached
            .as_ref()
            .map_or(true, |robots| robots.allows(url, &self.user_agent))
    }
}

/// Fetches robots.txt for the origin of `url`
///
/// Any failure (network error, non-2xx status, unreadable body) yields an
/// allow-all policy.
pub async fn fetch_robots(client: &Client, url: &Url) -> RobotsRules {
    let robots_url = match url.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", url, e);
            return RobotsRules::permissive();
        }
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", robots_url, e);
            return RobotsRules::permissive();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt at {} returned {}, allowing all",
            robots_url,
            response.status()
        );
        return RobotsRules::permissive();
    }

    match response.text().await {
        Ok(body) => RobotsRules::parse(body),
        Err(e) => {
            tracing::debug!("robots.txt body unreadable at {}: {}", robots_url, e);
            RobotsRules::permissive()
        }
    }
}

/// Returns the product token robots.txt groups are matched against
///
/// `"Mozilla/5.0 (Windows NT 10.0)"` becomes `"Mozilla"`.
pub fn product_token(user_agent: &str) -> &str {
    let end = user_agent
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(user_agent.len());
    &user_agent[..end]
}
