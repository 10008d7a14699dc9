//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with a stable browser-like identity
//! - The opt-in legacy TLS compatibility mode
//! - GET requests with a per-request timeout
//! - Redirect hops gated by the caller (scope and dedup)
//! - Error classification into bad-status and transport failures

use crate::config::HttpConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, tls, Client, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Number of leading body bytes inspected when sniffing for markup
const SNIFF_LEN: usize = 512;

/// Tags that mark a body as HTML when they open the document
const HTML_SIGNATURES: &[&str] = &[
    "<!doctype html",
    "<html",
    "<head",
    "<body",
    "<script",
    "<iframe",
    "<h1",
    "<div",
    "<font",
    "<table",
    "<a",
    "<style",
    "<title",
    "<b",
    "<br",
    "<p",
    "<!--",
];

/// Decides whether a redirect hop may be followed
///
/// Called with the URL originally requested and the next hop's target. When
/// it returns false the chain stops and the redirect response itself is
/// returned as [`FetchResult::RedirectStopped`].
pub type RedirectGate = Arc<dyn Fn(&Url, &Url) -> bool + Send + Sync>;

/// Transport-level failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Request exceeded the configured timeout
    Timeout,
    /// Connection refused, reset, or DNS failure
    Connect,
    /// Certificate rejected or handshake failed
    Tls,
    /// Redirect loop or too many redirects
    Redirect,
    /// Response body could not be read completely
    Body,
    /// Anything else the client reports
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Tls => "tls",
            Self::Redirect => "redirect",
            Self::Body => "body",
            Self::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the resource
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value (empty if missing)
        content_type: String,
        /// Raw response body
        body: Vec<u8>,
    },

    /// The server answered with a non-success status
    BadStatus {
        /// The HTTP status code
        status_code: u16,
    },

    /// A redirect the gate refused to follow
    RedirectStopped {
        /// The 3xx status code
        status_code: u16,
        /// Absolute target of the refused hop
        location: Url,
    },

    /// Timeout, connection reset, TLS or DNS failure
    TransportFailure {
        /// Failure category
        kind: TransportKind,
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns true if the body is textual (HTML, CSS, JS, XML, JSON, plain text)
    pub fn is_text(&self) -> bool {
        match self {
            Self::Success { content_type, .. } => is_text_content_type(content_type),
            _ => false,
        }
    }

    /// Returns true if the body should be parsed for links
    ///
    /// See [`is_markup`] for how mislabelled pages are recognised.
    pub fn is_html(&self) -> bool {
        match self {
            Self::Success {
                content_type, body, ..
            } => is_markup(content_type, body),
            _ => false,
        }
    }
}

/// Returns true if a response should be treated as an HTML document
///
/// HTML content types always qualify. Old servers frequently label pages as
/// `text/plain` or `application/octet-stream`, or send no Content-Type at
/// all; for those the start of the body decides.
///
/// # Example
///
/// ```
/// use site_mirror::crawler::is_markup;
///
/// assert!(is_markup("text/html", b""));
/// assert!(is_markup("", b"<!DOCTYPE html><html></html>"));
/// assert!(is_markup("text/plain", b"  <HTML><body>hi</body></HTML>"));
/// assert!(!is_markup("text/plain", b"just some notes"));
/// assert!(!is_markup("image/png", b"<html>"));
/// ```
pub fn is_markup(content_type: &str, body: &[u8]) -> bool {
    if is_html_content_type(content_type) {
        return true;
    }

    let mime = mime_essence(content_type);
    let ambiguous =
        mime.is_empty() || mime == "text/plain" || mime == "application/octet-stream";
    ambiguous && sniffs_as_html(body)
}

/// Checks whether the body opens with a tag typical of an HTML document
fn sniffs_as_html(body: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&body[..body.len().min(SNIFF_LEN)]);
    let head = head
        .trim_start_matches('\u{feff}')
        .trim_start()
        .to_ascii_lowercase();

    HTML_SIGNATURES.iter().any(|signature| {
        head.strip_prefix(signature).map_or(false, |rest| {
            // The tag name must end here: `<b>` matches, `<base` does not
            *signature == "<!--"
                || rest
                    .chars()
                    .next()
                    .map_or(false, |c| c == '>' || c == '/' || c.is_ascii_whitespace())
        })
    })
}

/// Returns true for content types that carry HTML markup
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = mime_essence(content_type);
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Returns true for content types that carry text rather than binary data
pub fn is_text_content_type(content_type: &str) -> bool {
    let mime = mime_essence(content_type);
    mime.starts_with("text/")
        || mime.ends_with("+xml")
        || mime.ends_with("+json")
        || matches!(
            mime.as_str(),
            "application/javascript" | "application/json" | "application/xml"
        )
}

/// Strips parameters (`; charset=...`) and lowercases a Content-Type value
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Builds the shared HTTP client
///
/// Redirects are followed up to ten hops, and only while `gate` accepts
/// each hop.
///
/// The default profile uses rustls with full certificate validation. When
/// `tls_compat` is set the client switches to the native TLS backend with
/// certificate and hostname validation disabled and TLS 1.0 as the protocol
/// floor, so servers with expired, self-signed or outdated configurations can
/// still be archived. Whether TLS 1.0 actually negotiates also depends on the
/// system TLS library policy.
///
/// # Arguments
///
/// * `config` - The HTTP configuration
/// * `gate` - Consulted before every redirect hop
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::HttpConfig;
/// use site_mirror::crawler::build_http_client;
/// use std::sync::Arc;
///
/// let follow_all = Arc::new(|_: &url::Url, _: &url::Url| true);
/// let client = build_http_client(&HttpConfig::default(), follow_all).unwrap();
/// ```
pub fn build_http_client(
    config: &HttpConfig,
    gate: RedirectGate,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(accept) = HeaderValue::from_str(&config.accept) {
        headers.insert(ACCEPT, accept);
    }

    let builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .redirect(redirect_policy(gate))
        .gzip(true)
        .brotli(true);

    let builder = if config.tls_compat {
        tracing::warn!(
            "TLS compatibility mode enabled: certificate validation is disabled for this crawl"
        );
        builder
            .use_native_tls()
            .min_tls_version(tls::Version::TLS_1_0)
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
    } else {
        builder.use_rustls_tls()
    };

    builder.build()
}

fn redirect_policy(gate: RedirectGate) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }

        // The first entry is the URL the caller asked for
        let allowed = attempt
            .previous()
            .first()
            .map_or(false, |requested| gate(requested, attempt.url()));

        if allowed {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

/// Issues HTTP GET requests for the crawler
///
/// Wraps a shared [`Client`]; cloning a fetcher shares the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds a fetcher from the HTTP configuration and a redirect gate
    pub fn new(config: &HttpConfig, gate: RedirectGate) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, gate)?,
        })
    }

    /// Fetches a URL with a single GET request
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | Success |
    /// | 3xx the gate refused | RedirectStopped |
    /// | Any other status | BadStatus |
    /// | Timeout | TransportFailure(Timeout) |
    /// | Certificate or handshake error | TransportFailure(Tls) |
    /// | Connection refused / DNS | TransportFailure(Connect) |
    /// | Redirect loop or chain > 10 | TransportFailure(Redirect) |
    /// | Body read error | TransportFailure(Body) |
    ///
    /// Nothing is retried; every outcome is final for this URL.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(e),
        };

        let status = response.status();
        if status.is_redirection() {
            if let Some(location) = redirect_location(&response) {
                return FetchResult::RedirectStopped {
                    status_code: status.as_u16(),
                    location,
                };
            }
        }

        if !status.is_success() {
            return FetchResult::BadStatus {
                status_code: status.as_u16(),
            };
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        match response.bytes().await {
            Ok(bytes) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                content_type,
                body: bytes.to_vec(),
            },
            Err(e) if e.is_timeout() => FetchResult::TransportFailure {
                kind: TransportKind::Timeout,
                error: e.to_string(),
            },
            Err(e) => FetchResult::TransportFailure {
                kind: TransportKind::Body,
                error: e.to_string(),
            },
        }
    }
}

/// Resolves the Location header of a redirect response
fn redirect_location(response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    response.url().join(location).ok()
}

/// Maps a client error onto a transport failure category
fn classify_error(e: reqwest::Error) -> FetchResult {
    let kind = if e.is_timeout() {
        TransportKind::Timeout
    } else if is_tls_error(&e) {
        TransportKind::Tls
    } else if e.is_connect() {
        TransportKind::Connect
    } else if e.is_redirect() {
        TransportKind::Redirect
    } else if e.is_body() || e.is_decode() {
        TransportKind::Body
    } else {
        TransportKind::Other
    };

    FetchResult::TransportFailure {
        kind,
        error: e.to_string(),
    }
}

/// Walks the error source chain looking for a TLS-layer cause
///
/// reqwest reports handshake failures as connect errors without a dedicated
/// predicate, so the underlying messages are inspected instead. The outer
/// error is skipped: its message embeds the request URL.
fn is_tls_error(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        let message = err.to_string().to_ascii_lowercase();
        if message.contains("certificate")
            || message.contains("handshake")
            || message.contains("tls")
            || message.contains("ssl")
        {
            return true;
        }
        source = err.source();
    }
    false
}
