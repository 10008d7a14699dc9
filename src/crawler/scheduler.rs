//! Worker pool draining the frontier
//!
//! This module handles:
//! - Spawning a fixed number of workers sharing one frontier
//! - Per-worker politeness delays between requests
//! - Fetching, parsing, rewriting, and persisting each work item
//! - Feeding discovered links and assets back into the frontier
//! - Merging per-worker statistics once the pool has joined

use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{Frontier, Lease, PushOutcome};
use crate::crawler::parser::parse_html;
use crate::crawler::policy::{report, Disposition, Issue};
use crate::crawler::rewrite::rewrite_links;
use crate::output::CrawlStatistics;
use crate::state::{ItemKind, ItemState, Throttle};
use crate::storage::Storage;
use crate::url::url_to_path;
use crate::MirrorError;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

/// Everything a worker needs, shared by all workers
#[derive(Clone)]
pub struct WorkerContext {
    pub frontier: Frontier,
    pub fetcher: Fetcher,
    pub storage: Arc<dyn Storage>,
    /// Minimum delay between two requests of the same worker
    pub delay: Duration,
    /// Leave assets already present in the output directory untouched
    pub skip_existing_assets: bool,
    /// Point in-scope references of saved pages at the mirrored files
    pub rewrite_links: bool,
}

/// Fixed-size pool of crawl workers
pub struct WorkerPool {
    context: WorkerContext,
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool of `workers` workers (at least one)
    pub fn new(context: WorkerContext, workers: usize) -> Self {
        Self {
            context,
            workers: workers.max(1),
        }
    }

    /// Runs all workers until the frontier is drained or closed
    ///
    /// Returns the merged statistics of every worker. If a worker aborts the
    /// crawl, the remaining workers still finish their in-flight items before
    /// the error is returned.
    pub async fn run(self) -> Result<CrawlStatistics, MirrorError> {
        tracing::info!("Starting {} workers", self.workers);

        let mut set = JoinSet::new();
        for id in 0..self.workers {
            set.spawn(run_worker(id, self.context.clone()));
        }

        let mut stats = CrawlStatistics::default();
        let mut first_error = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(worker_stats)) => stats.merge(&worker_stats),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("Worker task failed: {}", e);
                    self.context.frontier.close();
                    first_error.get_or_insert(MirrorError::Worker(e));
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        stats.scope_rejections = self.context.frontier.scope_rejections();
        stats.duplicate_rejections = self.context.frontier.duplicate_rejections();
        Ok(stats)
    }
}

async fn run_worker(id: usize, ctx: WorkerContext) -> Result<CrawlStatistics, MirrorError> {
    let mut stats = CrawlStatistics::default();
    let mut throttle = Throttle::new(ctx.delay);

    tracing::debug!("Worker {} started", id);

    while let Some(lease) = ctx.frontier.pop().await {
        if let Err(e) = process_item(&ctx, &mut throttle, &mut stats, lease).await {
            ctx.frontier.close();
            return Err(e);
        }
    }

    tracing::debug!(
        "Worker {} finished after {} requests",
        id,
        throttle.request_count
    );
    Ok(stats)
}

/// Processes one leased item from fetch to disk
///
/// Per-URL failures are logged, counted, and end with the lease marked failed.
/// Only an unwritable output root is returned as an error.
async fn process_item(
    ctx: &WorkerContext,
    throttle: &mut Throttle,
    stats: &mut CrawlStatistics,
    mut lease: Lease,
) -> Result<(), MirrorError> {
    let url = lease.url().clone();
    let kind = lease.kind();

    if kind == ItemKind::Asset && ctx.skip_existing_assets && ctx.storage.exists(&url_to_path(&url))
    {
        tracing::debug!("Asset already mirrored, skipping fetch: {}", url);
        stats.assets_reused += 1;
        lease.persisted();
        return Ok(());
    }

    lease.advance(ItemState::Fetching);
    throttle.acquire().await;
    tracing::debug!("Fetching {} {}", kind, url);

    let result = ctx.fetcher.fetch(&url).await;
    let is_html = result.is_html();

    let (final_url, body) = match result {
        FetchResult::Success {
            final_url, body, ..
        } => (final_url, body),
        FetchResult::BadStatus { status_code } => {
            stats.bad_status += 1;
            report(&Issue::BadStatus { url, status_code });
            lease.failed();
            return Ok(());
        }
        FetchResult::RedirectStopped { location, .. } => {
            let offsite = !ctx.frontier.accepts(&location);
            if offsite {
                stats.offsite_redirects += 1;
            } else {
                stats.duplicate_redirects += 1;
            }
            report(&Issue::RedirectStopped {
                url,
                location,
                offsite,
            });
            lease.failed();
            return Ok(());
        }
        FetchResult::TransportFailure { kind, error } => {
            stats.transport_failures += 1;
            report(&Issue::TransportFailure { url, kind, error });
            lease.failed();
            return Ok(());
        }
    };

    lease.advance(ItemState::Fetched);

    let markup = if kind == ItemKind::Page && is_html {
        let html = String::from_utf8_lossy(&body).into_owned();
        let parsed = parse_html(&html, &final_url);

        if parsed.link_count() == 0 && !html.trim().is_empty() {
            stats.parse_degradations += 1;
            report(&Issue::ParseDegradation {
                url: url.clone(),
                bytes: body.len(),
            });
        }

        if let Some(title) = &parsed.title {
            tracing::debug!("Parsed \"{}\" at {}", title, url);
        }

        for link in parsed.page_links {
            enqueue(&ctx.frontier, link, ItemKind::Page);
        }
        for asset in parsed.asset_links {
            enqueue(&ctx.frontier, asset, ItemKind::Asset);
        }

        lease.advance(ItemState::Parsed);
        Some(html)
    } else {
        None
    };

    // Redirect targets were claimed for this item and are saved alongside it
    let mut targets = vec![url.clone()];
    targets.extend(lease.redirect_targets());

    for target in &targets {
        let content = match &markup {
            Some(html) if ctx.rewrite_links => Cow::Owned(
                rewrite_links(html, &final_url, ctx.frontier.origin(), target).into_bytes(),
            ),
            _ => Cow::Borrowed(body.as_slice()),
        };

        match ctx.storage.save(&url_to_path(target), &content) {
            Ok(written) => {
                tracing::info!("Saved {} -> {}", target, written.display());
                stats.bytes_written += content.len() as u64;
            }
            Err(e) => {
                stats.persistence_failures += 1;
                let root_unwritable = ctx.storage.check_writable().is_err();
                let reason = e.to_string();
                let issue = Issue::PersistenceFailure {
                    url: target.clone(),
                    error: reason.clone(),
                    root_unwritable,
                };
                lease.failed();

                if report(&issue) == Disposition::Abort {
                    return Err(MirrorError::OutputRootUnwritable {
                        path: ctx.storage.root().to_path_buf(),
                        reason,
                    });
                }
                return Ok(());
            }
        }
    }

    let saved = targets.len() as u64;
    match kind {
        ItemKind::Page => stats.pages_saved += saved,
        ItemKind::Asset => stats.assets_saved += saved,
    }
    lease.persisted();
    Ok(())
}

fn enqueue(frontier: &Frontier, url: Url, kind: ItemKind) {
    match frontier.push(url.clone(), kind) {
        PushOutcome::Enqueued => tracing::trace!("Enqueued {} {}", kind, url),
        PushOutcome::OutOfScope => {
            report(&Issue::ScopeRejection { url });
        }
        PushOutcome::Duplicate => {
            report(&Issue::DuplicateRejection { url });
        }
        PushOutcome::Closed => {}
    }
}
