//! Crawler module for mirroring a site
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier with its visited set
//! - HTTP fetching with a fixed browser-like identity
//! - HTML parsing for page links and assets
//! - Rewriting saved pages to link into the mirror
//! - The worker pool and per-worker throttling
//! - The failure policy
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
pub mod policy;
mod rewrite;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlHandle};
pub use fetcher::{
    build_http_client, is_html_content_type, is_markup, is_text_content_type, FetchResult,
    Fetcher, RedirectGate, TransportKind,
};
pub use frontier::{Frontier, Lease, PushOutcome, VisitRecord, VisitedSnapshot};
pub use parser::{parse_html, ParsedPage};
pub use policy::{disposition, Disposition, Issue};
pub use rewrite::rewrite_links;
pub use scheduler::{WorkerContext, WorkerPool};
