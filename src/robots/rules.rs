//! Rules from one origin's robots.txt

use robotstxt::DefaultMatcher;
use url::Url;

/// The robots.txt body for one origin, or the permissive default
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// `None` when robots.txt was missing, unreachable or not 2xx
    body: Option<String>,
}

impl RobotsRules {
    /// Rules parsed from a fetched robots.txt body
    pub fn parse(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    /// Rules that allow every URL
    pub fn permissive() -> Self {
        Self { body: None }
    }

    /// True when no robots.txt body is in effect
    pub fn is_permissive(&self) -> bool {
        self.body.as_deref().map_or(true, |b| b.trim().is_empty())
    }

    /// Checks whether `agent` may fetch `url`
    ///
    /// `agent` is the product token (e.g. `Mozilla`), not the full header.
    pub fn allows(&self, url: &Url, agent: &str) -> bool {
        match self.body.as_deref() {
            Some(body) if !body.trim().is_empty() => {
                DefaultMatcher::default().one_agent_allowed_by_robots(body, agent, url.as_str())
            }
            _ => true,
        }
    }
}
