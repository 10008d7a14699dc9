//! Crawler coordinator - main crawl orchestration logic
//!
//! This module ties the crawl together:
//! - Validating configuration and resolving the crawl origin
//! - Opening the output directory
//! - Seeding the frontier and running the worker pool
//! - Enforcing the optional crawl deadline and external cancellation
//! - Writing the sitemap once the frontier has settled

use crate::config::{validate, Config};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::{Frontier, PushOutcome};
use crate::crawler::scheduler::{WorkerContext, WorkerPool};
use crate::output::{find_mirrored_file, write_sitemap, CrawlStatistics, Sitemap};
use crate::state::ItemKind;
use crate::storage::{open_storage, FsStorage, Storage};
use crate::url::parse_start_url;
use crate::{ConfigError, MirrorError};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    origin: Url,
    frontier: Frontier,
    fetcher: Fetcher,
    storage: Arc<FsStorage>,
}

/// Cancels a running crawl from outside
///
/// Cancellation closes the frontier: workers finish the item they hold and
/// stop, and the sitemap is still written for what was persisted.
#[derive(Debug, Clone)]
pub struct CrawlHandle {
    frontier: Frontier,
}

impl CrawlHandle {
    pub fn cancel(&self) {
        if !self.frontier.is_closed() {
            tracing::info!("Crawl cancelled, waiting for in-flight requests");
        }
        self.frontier.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.frontier.is_closed()
    }
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(MirrorError)` - Invalid configuration, unwritable output root,
    ///   or an HTTP client that could not be built
    pub fn new(config: Config) -> Result<Self, MirrorError> {
        validate(&config)?;

        let start_url = parse_start_url(&config.crawler.start_url)?;
        let origin = match &config.crawler.origin {
            Some(origin) => parse_start_url(origin)?,
            None => start_url.clone(),
        };

        let storage = Arc::new(open_storage(Path::new(&config.output.directory))?);

        let frontier = Frontier::new(origin.clone());
        let fetcher = Fetcher::new(&config.http, frontier.redirect_gate())?;
        if frontier.push(start_url.clone(), ItemKind::Page) != PushOutcome::Enqueued {
            return Err(ConfigError::Validation(format!(
                "start URL {} is outside the crawl origin {}",
                start_url, origin
            ))
            .into());
        }

        tracing::info!(
            "Mirroring {} into {} (origin {})",
            start_url,
            storage.root().display(),
            origin
        );

        Ok(Self {
            config,
            origin,
            frontier,
            fetcher,
            storage,
        })
    }

    /// Returns the crawl origin
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Returns a handle that can cancel the crawl while [`run`](Self::run) is awaited
    pub fn handle(&self) -> CrawlHandle {
        CrawlHandle {
            frontier: self.frontier.clone(),
        }
    }

    /// Runs the crawl to completion
    ///
    /// Returns once the frontier is drained (or closed by cancellation or the
    /// deadline) and every worker has joined. The sitemap is written exactly
    /// once, after that point.
    pub async fn run(self) -> Result<CrawlStatistics, MirrorError> {
        let start_time = Instant::now();

        let deadline = self.config.crawler.max_duration_secs.map(|secs| {
            let handle = self.handle();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                tracing::warn!("Crawl deadline of {}s reached, stopping", secs);
                handle.cancel();
            })
        });

        let context = WorkerContext {
            frontier: self.frontier.clone(),
            fetcher: self.fetcher.clone(),
            storage: self.storage.clone(),
            delay: Duration::from_millis(self.config.crawler.delay_ms),
            skip_existing_assets: self.config.crawler.skip_existing_assets,
            rewrite_links: self.config.output.rewrite_links,
        };
        let result = WorkerPool::new(context, self.config.crawler.concurrency as usize)
            .run()
            .await;

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let mut stats = result?;

        let snapshot = self.frontier.snapshot().ok_or(MirrorError::NotDrained)?;
        stats.record_snapshot(&snapshot);

        let sitemap_file = &self.config.output.sitemap_file;
        if let Some(url) = find_mirrored_file(&snapshot, Path::new(sitemap_file)) {
            tracing::warn!(
                "{} was mirrored to {} and is replaced by the sitemap",
                url,
                sitemap_file
            );
        }

        let sitemap = Sitemap::from_snapshot(&self.origin, &snapshot);
        write_sitemap(
            &sitemap,
            self.storage.root(),
            sitemap_file,
        )?;

        stats.elapsed = start_time.elapsed();
        tracing::info!(
            "Crawl completed: {} pages and {} assets saved in {:?}",
            stats.pages_saved,
            stats.assets_saved,
            stats.elapsed
        );

        Ok(stats)
    }
}

/// Runs a complete crawl operation
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed; individual URLs may still have failed
/// * `Err(MirrorError)` - Crawl could not start, or the output root became unwritable
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::load_config;
/// use site_mirror::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("mirror.toml"))?;
/// let stats = run_crawl(config).await?;
/// println!("{} pages saved", stats.pages_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlStatistics, MirrorError> {
    Coordinator::new(config)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.crawler.start_url = "https://example.com/docs/".to_string();
        config.output.directory = dir.path().join("mirror").display().to_string();
        config
    }

    #[test]
    fn test_coordinator_creation() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(create_test_config(&dir)).unwrap();

        assert_eq!(coordinator.origin().as_str(), "https://example.com/docs/");
        assert!(dir.path().join("mirror").is_dir());
        assert!(!coordinator.handle().is_cancelled());
    }

    #[test]
    fn test_origin_defaults_scheme() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.crawler.start_url = "example.com/docs/".to_string();
        config.crawler.origin = Some("example.com".to_string());

        let coordinator = Coordinator::new(config).unwrap();
        assert_eq!(coordinator.origin().as_str(), "https://example.com/");
    }

    #[test]
    fn test_start_url_outside_origin_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.crawler.origin = Some("https://example.com/blog/".to_string());

        assert!(matches!(
            Coordinator::new(config),
            Err(MirrorError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_unwritable_output_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let mut config = create_test_config(&dir);
        config.output.directory = blocker.display().to_string();

        assert!(matches!(
            Coordinator::new(config),
            Err(MirrorError::OutputRootUnwritable { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_run_writes_empty_sitemap() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(create_test_config(&dir)).unwrap();
        coordinator.handle().cancel();

        let stats = coordinator.run().await.unwrap();

        assert_eq!(stats.pages_saved, 0);
        let sitemap: Sitemap = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("mirror").join("sitemap.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(sitemap.total_pages, 0);
    }
}
