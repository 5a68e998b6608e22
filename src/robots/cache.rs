//! Cached robots.txt entry for one origin
//!
//! Entries expire after 24 hours, so very long crawls pick up changes a site
//! owner makes mid-run.

use crate::robots::RobotsRules;
use chrono::{DateTime, Duration, Utc};
use url::Url;

/// How long fetched rules stay valid
const TTL_HOURS: i64 = 24;

/// Rules for one origin and when they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: RobotsRules,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Stamps freshly fetched rules with the current time
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Checks whether the entry is older than its time to live
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(TTL_HOURS)
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    pub fn allows(&self, url: &Url, agent: &str) -> bool {
        self.rules.allows(url, agent)
    }
}
