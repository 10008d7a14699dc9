use crate::UrlError;
use url::Url;

/// Reference prefixes that never point at a fetchable resource
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a URL string into the identity used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme and a host
/// 3. Host lowercasing, default-port removal and dot-segment resolution are
///    applied by the parser itself
/// 4. Remove the fragment (everything after #)
/// 5. Drop an empty query string (trailing `?`)
///
/// Trailing slashes and query parameters are kept: `/blog` and `/blog/` map to
/// different files on disk and are distinct entities.
///
/// # Examples
///
/// ```
/// use site_mirror::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM:443/a/../b/?#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize(url)
}

/// Normalizes an already parsed URL
pub fn normalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Parses a user-supplied start URL, defaulting to `https://` when no scheme is given
///
/// # Examples
///
/// ```
/// use site_mirror::url::parse_start_url;
///
/// let url = parse_start_url("example.com").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// ```
pub fn parse_start_url(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.contains("://") {
        normalize_url(trimmed)
    } else {
        normalize_url(&format!("https://{}", trimmed))
    }
}

/// Resolves a markup reference against a base URL and normalizes the result
///
/// Handles relative (`img.png`, `../a`), root-relative (`/a`), protocol-relative
/// (`//cdn.example.com/x.js`) and absolute references.
///
/// Returns None if the reference should be ignored:
/// - empty or fragment-only references
/// - `javascript:`, `mailto:`, `tel:` and `data:` references
/// - references that fail to resolve or resolve to a non-HTTP(S) URL
pub fn resolve_reference(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize(absolute).ok()
}
