//! URL handling module
//!
//! This module resolves links into canonical absolute URLs and applies the
//! crawl's link filters: same-host scoping and path-substring exclusion.

mod normalize;
mod scope;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use normalize::{canonicalize, resolve};
pub use scope::{in_scope, is_excluded, netloc};

/// Outcome of running one href through the link filters
#[derive(Debug)]
pub enum LinkDecision {
    /// Link resolved, in scope and not excluded
    Accepted(Url),
    /// Resolved host does not contain the scope
    OutOfScope(Url),
    /// Resolved URL contains an exclusion substring
    Excluded(Url),
    /// Resolved to a non-http(s) scheme such as `mailto:`
    Unsupported(String),
    /// The href could not be resolved at all
    Malformed(UrlError),
}

impl LinkDecision {
    /// Returns the accepted URL, if any
    pub fn accepted(self) -> Option<Url> {
        match self {
            Self::Accepted(url) => Some(url),
            _ => None,
        }
    }
}

/// Classifies a raw href found on the page at `base`
///
/// Checks are applied in order: resolution, scheme, scope, exclusions.
pub fn classify_link(base: &Url, href: &str, scope: &str, exclusions: &[String]) -> LinkDecision {
    let url = match resolve(base, href) {
        Ok(url) => url,
        Err(UrlError::InvalidScheme(scheme)) => return LinkDecision::Unsupported(scheme),
        Err(e) => return LinkDecision::Malformed(e),
    };

    if !in_scope(&url, scope) {
        return LinkDecision::OutOfScope(url);
    }

    if is_excluded(&url, exclusions) {
        return LinkDecision::Excluded(url);
    }

    LinkDecision::Accepted(url)
}

/// Resolves and filters a link, returning the canonical URL if it should be followed
///
/// Malformed hrefs never abort the caller: they are logged at error level and
/// yield `None`, like every other rejected link.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webcrawler::url::normalize;
///
/// let base = Url::parse("https://example.com/a").unwrap();
/// let exclusions = vec!["/fr".to_string()];
///
/// let next = normalize(&base, "/b", "example.com", &exclusions);
/// assert_eq!(next.unwrap().as_str(), "https://example.com/b");
///
/// assert!(normalize(&base, "https://external.com/x", "example.com", &exclusions).is_none());
/// assert!(normalize(&base, "/fr/c", "example.com", &exclusions).is_none());
/// ```
pub fn normalize(base: &Url, href: &str, scope: &str, exclusions: &[String]) -> Option<Url> {
    match classify_link(base, href, scope, exclusions) {
        LinkDecision::Malformed(e) => {
            tracing::error!("Error processing URL {}: {}", href, e);
            None
        }
        decision => decision.accepted(),
    }
}
