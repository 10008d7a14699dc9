use serde::{Deserialize, Serialize};

/// Browser-like identity sent with every request; some sites refuse to serve
/// crawlers that announce themselves.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Main configuration structure for Site-Mirror
///
/// Every section is optional in the TOML file; missing sections and keys fall
/// back to the defaults below. The start URL is normally supplied on the
/// command line and merged in before validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

/// Crawl scope and scheduling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    pub start_url: String,

    /// URL prefix bounding the crawl; defaults to the normalized start URL
    pub origin: Option<String>,

    /// Number of concurrent workers
    pub concurrency: u32,

    /// Minimum time between two requests issued by the same worker (milliseconds)
    pub delay_ms: u64,

    /// Optional wall-clock limit for the whole crawl (seconds)
    pub max_duration_secs: Option<u64>,

    /// Reuse assets already present in the output directory instead of re-fetching them
    pub skip_existing_assets: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            origin: None,
            concurrency: 5,
            delay_ms: 1000,
            max_duration_secs: None,
            skip_existing_assets: true,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Legacy TLS compatibility mode.
    ///
    /// When enabled the client accepts invalid or self-signed certificates,
    /// ignores hostname mismatches and allows protocol versions down to TLS 1.0.
    /// This trades transport security for the ability to archive sites running
    /// on outdated servers. Only enable it for best-effort mirroring of content
    /// you do not need to trust.
    pub tls_compat: bool,

    /// User-Agent header value
    pub user_agent: String,

    /// Accept header value
    pub accept: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            tls_compat: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory of the mirror
    pub directory: String,

    /// File name of the manifest, written at the output root
    pub sitemap_file: String,

    /// Rewrite in-scope references in saved pages to relative mirror paths
    pub rewrite_links: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "site_output".to_string(),
            sitemap_file: "sitemap.json".to_string(),
            rewrite_links: true,
        }
    }
}
