use url::{Position, Url};

/// Returns the network location (`host[:port]`) of a URL
///
/// The port is only present when it differs from the scheme's default.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webcrawler::url::netloc;
///
/// let url = Url::parse("https://example.com/path").unwrap();
/// assert_eq!(netloc(&url), Some("example.com"));
///
/// let url = Url::parse("http://127.0.0.1:8080/path").unwrap();
/// assert_eq!(netloc(&url), Some("127.0.0.1:8080"));
/// ```
pub fn netloc(url: &Url) -> Option<&str> {
    url.host_str()?;
    Some(&url[Position::BeforeHost..Position::AfterPort])
}

/// Checks whether a URL falls inside a host scope
///
/// This is a substring test on the network location, not host equality:
/// scope `example.com` also admits `blog.example.com` and `notexample.com`.
pub fn in_scope(url: &Url, scope: &str) -> bool {
    netloc(url).map_or(false, |loc| loc.contains(scope))
}

/// Checks whether any exclusion substring occurs in the URL's string form
pub fn is_excluded(url: &Url, exclusions: &[String]) -> bool {
    let text = url.as_str();
    exclusions.iter().any(|excluded| text.contains(excluded.as_str()))
}
