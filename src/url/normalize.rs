use crate::UrlError;
use url::Url;

/// Turns an absolute URL string into its canonical form
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Reject URLs without a host
/// 4. Remove the fragment (everything after #)
///
/// Host lowercasing, default-port removal and dot-segment resolution are
/// performed by the parser itself. Nothing else is rewritten, so an absolute
/// URL without a fragment comes back unchanged.
///
/// # Examples
///
/// ```
/// use webcrawler::url::canonicalize;
///
/// let url = canonicalize("https://EXAMPLE.com/a/../b#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b");
/// ```
pub fn canonicalize(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url)
}

/// Resolves `href` against `base` and canonicalizes the result
///
/// Relative references (`page`, `../page`, `/page`, `//host/page`, `?q=1`)
/// are resolved the same way a browser resolves them.
pub fn resolve(base: &Url, href: &str) -> Result<Url, UrlError> {
    let url = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
    finish(url)
}

fn finish(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}
