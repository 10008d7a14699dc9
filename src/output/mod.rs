//! Output module for the crawl results
//!
//! This module handles:
//! - Building and writing the `sitemap.json` manifest
//! - Recording and printing crawl statistics

mod sitemap;
pub mod stats;

pub use sitemap::{find_mirrored_file, write_sitemap, Sitemap};
pub use stats::{print_statistics, CrawlStatistics};
