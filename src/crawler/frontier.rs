//! Shared crawl frontier
//!
//! The frontier owns the visited set and the two work queues (pages and
//! assets). Every URL is checked against the crawl origin, then claimed in the
//! visited set and enqueued in one critical section, so no URL is ever handed
//! to two workers.
//!
//! Workers take items with [`Frontier::pop`] and receive a [`Lease`]. The lease
//! counts as in flight until it reaches a terminal state or is dropped, which
//! is what lets the frontier tell "empty for now" apart from "done".
//!
//! Redirect targets are claimed on behalf of the item that was requested
//! (see [`Frontier::claim_redirect`]) and share its state from then on.

use crate::crawler::fetcher::RedirectGate;
use crate::state::{ItemKind, ItemState};
use crate::url::{is_in_scope, normalize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use url::Url;

/// What the frontier knows about a URL it has accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitRecord {
    pub kind: ItemKind,
    pub state: ItemState,
}

/// Visited records keyed by normalized URL
pub type VisitedSnapshot = HashMap<String, VisitRecord>;

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Claimed and queued for a worker
    Enqueued,
    /// Does not start with the crawl origin
    OutOfScope,
    /// Already claimed earlier in this run
    Duplicate,
    /// The frontier was closed
    Closed,
}

#[derive(Debug, Default)]
struct Inner {
    pages: VecDeque<Url>,
    assets: VecDeque<Url>,
    visited: HashMap<String, VisitRecord>,
    /// Redirect targets claimed by a requested URL, keyed by the requested URL
    redirects: HashMap<String, Vec<Url>>,
    in_flight: usize,
    closed: bool,
    scope_rejections: u64,
    duplicate_rejections: u64,
}

impl Inner {
    fn is_drained(&self) -> bool {
        self.pages.is_empty() && self.assets.is_empty() && self.in_flight == 0
    }

    fn next_item(&mut self) -> Option<(Url, ItemKind)> {
        if let Some(url) = self.pages.pop_front() {
            return Some((url, ItemKind::Page));
        }
        self.assets.pop_front().map(|url| (url, ItemKind::Asset))
    }
}

#[derive(Debug)]
struct Shared {
    origin: Url,
    inner: Mutex<Inner>,
    notify: Notify,
}

/// Work queue and visited set shared by all workers
///
/// Cloning is cheap; every clone refers to the same frontier.
#[derive(Debug, Clone)]
pub struct Frontier {
    shared: Arc<Shared>,
}

impl Frontier {
    /// Creates an empty frontier bounded by `origin`
    pub fn new(origin: Url) -> Self {
        Self {
            shared: Arc::new(Shared {
                origin,
                inner: Mutex::new(Inner::default()),
                notify: Notify::new(),
            }),
        }
    }

    /// Returns the crawl origin
    pub fn origin(&self) -> &Url {
        &self.shared.origin
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner holds no invariant that a panicking holder could break halfway
        self.shared
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Offers a URL to the frontier
    ///
    /// The URL is normalized, checked against the origin, and then claimed in
    /// the visited set. A URL is claimed at most once per run; later offers of
    /// the same URL report [`PushOutcome::Duplicate`] whatever their kind.
    pub fn push(&self, url: Url, kind: ItemKind) -> PushOutcome {
        let url = match normalize(url) {
            Ok(url) => url,
            Err(_) => return self.reject_out_of_scope(),
        };

        if !is_in_scope(&url, &self.shared.origin) {
            return self.reject_out_of_scope();
        }

        let mut inner = self.lock();
        if inner.closed {
            return PushOutcome::Closed;
        }

        let key = url.as_str().to_string();
        if inner.visited.contains_key(&key) {
            inner.duplicate_rejections += 1;
            return PushOutcome::Duplicate;
        }

        inner.visited.insert(
            key,
            VisitRecord {
                kind,
                state: ItemState::Enqueued,
            },
        );
        match kind {
            ItemKind::Page => inner.pages.push_back(url),
            ItemKind::Asset => inner.assets.push_back(url),
        }
        drop(inner);

        self.shared.notify.notify_waiters();
        PushOutcome::Enqueued
    }

    /// Returns true if `url` falls inside the crawl origin
    pub fn accepts(&self, url: &Url) -> bool {
        normalize(url.clone()).map_or(false, |url| is_in_scope(&url, &self.shared.origin))
    }

    /// Claims a redirect target on behalf of the URL that was requested
    ///
    /// The target takes the kind and state of the requested item and is never
    /// queued on its own. Outcomes match [`push`](Self::push): a target outside
    /// the origin or already claimed is refused. A `requested` URL that was
    /// never handed out by [`pop`](Self::pop) claims nothing and reports
    /// [`PushOutcome::Closed`].
    pub fn claim_redirect(&self, requested: &Url, target: &Url) -> PushOutcome {
        let target = match normalize(target.clone()) {
            Ok(url) if is_in_scope(&url, &self.shared.origin) => url,
            _ => return self.reject_out_of_scope(),
        };
        let requested_key = match normalize(requested.clone()) {
            Ok(url) => url.as_str().to_string(),
            Err(_) => return PushOutcome::Closed,
        };

        let mut inner = self.lock();
        if inner.closed {
            return PushOutcome::Closed;
        }

        let Some(owner) = inner.visited.get(&requested_key).copied() else {
            return PushOutcome::Closed;
        };

        let key = target.as_str().to_string();
        if inner.visited.contains_key(&key) {
            inner.duplicate_rejections += 1;
            return PushOutcome::Duplicate;
        }

        inner.visited.insert(key, owner);
        inner
            .redirects
            .entry(requested_key)
            .or_default()
            .push(target);
        PushOutcome::Enqueued
    }

    /// Builds a redirect gate that lets a hop through only if its target could
    /// be claimed for the requested URL
    pub fn redirect_gate(&self) -> RedirectGate {
        let frontier = self.clone();
        Arc::new(move |requested: &Url, target: &Url| {
            frontier.claim_redirect(requested, target) == PushOutcome::Enqueued
        })
    }

    fn reject_out_of_scope(&self) -> PushOutcome {
        self.lock().scope_rejections += 1;
        PushOutcome::OutOfScope
    }

    /// Waits for the next work item
    ///
    /// Pages are handed out before assets. Returns `None` once the frontier is
    /// closed, or once both queues are empty and no lease is outstanding (no
    /// running worker can discover more work).
    pub async fn pop(&self) -> Option<Lease> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a wakeup between the check
            // and the await is not lost
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if inner.closed {
                    return None;
                }
                if let Some((url, kind)) = inner.next_item() {
                    inner.in_flight += 1;
                    let key = url.as_str().to_string();
                    return Some(Lease {
                        frontier: self.clone(),
                        key,
                        url,
                        kind,
                        state: ItemState::Enqueued,
                    });
                }
                if inner.in_flight == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Returns true when both queues are empty and nothing is in flight
    pub fn is_drained(&self) -> bool {
        self.lock().is_drained()
    }

    /// Stops handing out work
    ///
    /// Queued items stay unfetched. Leases already handed out complete
    /// normally; pushes after this point report [`PushOutcome::Closed`].
    pub fn close(&self) {
        let mut inner = self.lock();
        if !inner.closed {
            inner.closed = true;
            tracing::debug!(
                "Frontier closed with {} pages and {} assets still queued",
                inner.pages.len(),
                inner.assets.len()
            );
        }
        drop(inner);
        self.shared.notify.notify_waiters();
    }

    /// Returns true once [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns a copy of the visited set once the frontier has settled
    ///
    /// Settled means nothing is in flight and the frontier is either drained or
    /// closed. While any lease is outstanding this returns `None`.
    pub fn snapshot(&self) -> Option<VisitedSnapshot> {
        let inner = self.lock();
        let settled = inner.in_flight == 0 && (inner.closed || inner.is_drained());
        settled.then(|| inner.visited.clone())
    }

    /// Number of URLs rejected because they fall outside the origin
    pub fn scope_rejections(&self) -> u64 {
        self.lock().scope_rejections
    }

    /// Number of URLs rejected because they were already claimed
    pub fn duplicate_rejections(&self) -> u64 {
        self.lock().duplicate_rejections
    }

    /// Number of distinct URLs claimed so far
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Number of leases currently outstanding
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    fn record(&self, key: &str, state: ItemState, release: bool) {
        let mut inner = self.lock();
        let Inner {
            visited, redirects, ..
        } = &mut *inner;

        let claimed = redirects.get(key).into_iter().flatten().map(Url::as_str);
        for claimed_key in std::iter::once(key).chain(claimed) {
            if let Some(record) = visited.get_mut(claimed_key) {
                record.state = state;
            }
        }
        if release {
            inner.in_flight = inner.in_flight.saturating_sub(1);
        }
        drop(inner);

        if release {
            self.shared.notify.notify_waiters();
        }
    }
}

/// A work item handed to one worker
///
/// State changes go through [`advance`](Self::advance) and are mirrored into
/// the visited set. Dropping a lease before it reaches a terminal state
/// records the item as [`ItemState::Failed`].
#[derive(Debug)]
pub struct Lease {
    frontier: Frontier,
    key: String,
    url: Url,
    kind: ItemKind,
    state: ItemState,
}

impl Lease {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    /// Redirect targets claimed while fetching this item, in hop order
    pub fn redirect_targets(&self) -> Vec<Url> {
        self.frontier
            .lock()
            .redirects
            .get(&self.key)
            .cloned()
            .unwrap_or_default()
    }

    /// Moves the item to `next`
    ///
    /// Returns false and leaves the state untouched if the transition is not
    /// allowed. Reaching a terminal state releases the lease.
    pub fn advance(&mut self, next: ItemState) -> bool {
        if self.state.is_terminal() || !self.state.can_transition_to(next) {
            tracing::debug!(
                "Ignoring transition {} -> {} for {}",
                self.state,
                next,
                self.url
            );
            return false;
        }

        self.state = next;
        self.frontier.record(&self.key, next, next.is_terminal());
        true
    }

    /// Marks the item as written to the mirror
    pub fn persisted(mut self) {
        self.advance(ItemState::Persisted);
    }

    /// Marks the item as failed from whatever state it reached
    pub fn failed(mut self) {
        self.fail();
    }

    fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = ItemState::Failed;
            self.frontier.record(&self.key, ItemState::Failed, true);
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.fail();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn origin() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_push_enqueues_once() {
        let frontier = Frontier::new(origin());

        assert_eq!(
            frontier.push(url("https://example.com/a"), ItemKind::Page),
            PushOutcome::Enqueued
        );
        assert_eq!(
            frontier.push(url("https://example.com/a"), ItemKind::Page),
            PushOutcome::Duplicate
        );
        assert_eq!(frontier.visited_count(), 1);
        assert_eq!(frontier.duplicate_rejections(), 1);
    }

    #[test]
    fn test_push_dedups_on_normalized_form() {
        let frontier = Frontier::new(origin());

        frontier.push(url("https://example.com/a#top"), ItemKind::Page);
        assert_eq!(
            frontier.push(url("https://example.com/a"), ItemKind::Page),
            PushOutcome::Duplicate
        );
        assert_eq!(
            frontier.push(url("https://example.com/x/../a?"), ItemKind::Page),
            PushOutcome::Duplicate
        );
    }

    #[test]
    fn test_push_dedups_across_kinds() {
        let frontier = Frontier::new(origin());

        frontier.push(url("https://example.com/logo.png"), ItemKind::Asset);
        assert_eq!(
            frontier.push(url("https://example.com/logo.png"), ItemKind::Page),
            PushOutcome::Duplicate
        );
    }

    #[test]
    fn test_push_rejects_out_of_scope() {
        let frontier = Frontier::new(url("https://example.com/docs/"));

        assert_eq!(
            frontier.push(url("https://other.test/x"), ItemKind::Page),
            PushOutcome::OutOfScope
        );
        assert_eq!(
            frontier.push(url("https://example.com/blog/"), ItemKind::Page),
            PushOutcome::OutOfScope
        );
        assert_eq!(
            frontier.push(url("https://example.com/docs/intro"), ItemKind::Page),
            PushOutcome::Enqueued
        );
        assert_eq!(frontier.scope_rejections(), 2);
        assert_eq!(frontier.visited_count(), 1);
    }

    #[test]
    fn test_out_of_scope_is_never_recorded() {
        let frontier = Frontier::new(origin());

        frontier.push(url("https://other.test/x"), ItemKind::Page);
        frontier.push(url("https://other.test/x"), ItemKind::Page);

        assert_eq!(frontier.scope_rejections(), 2);
        assert_eq!(frontier.duplicate_rejections(), 0);
    }

    #[tokio::test]
    async fn test_pages_pop_before_assets() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/style.css"), ItemKind::Asset);
        frontier.push(url("https://example.com/a"), ItemKind::Page);

        let first = frontier.pop().await.unwrap();
        assert_eq!(first.kind(), ItemKind::Page);
        assert_eq!(first.url().as_str(), "https://example.com/a");
        first.persisted();

        let second = frontier.pop().await.unwrap();
        assert_eq!(second.kind(), ItemKind::Asset);
    }

    #[tokio::test]
    async fn test_pop_returns_none_when_drained() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/"), ItemKind::Page);

        let mut lease = frontier.pop().await.unwrap();
        assert!(!frontier.is_drained());
        assert!(lease.advance(ItemState::Fetching));
        assert!(lease.advance(ItemState::Fetched));
        lease.persisted();

        assert!(frontier.is_drained());
        assert!(frontier.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_pop_waits_for_in_flight_work() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/"), ItemKind::Page);
        let lease = frontier.pop().await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.pop().await.map(|l| l.url().clone()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // The in-flight page discovers a new link; the waiting worker gets it
        frontier.push(url("https://example.com/next"), ItemKind::Page);
        let popped = waiter.await.unwrap();
        assert_eq!(popped.unwrap().as_str(), "https://example.com/next");

        lease.persisted();
    }

    #[tokio::test]
    async fn test_waiters_released_when_last_lease_resolves() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/"), ItemKind::Page);
        let lease = frontier.pop().await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.pop().await.is_none() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        lease.persisted();

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_lease_is_failed() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/a"), ItemKind::Page);

        let mut lease = frontier.pop().await.unwrap();
        lease.advance(ItemState::Fetching);
        drop(lease);

        let snapshot = frontier.snapshot().unwrap();
        assert_eq!(
            snapshot["https://example.com/a"].state,
            ItemState::Failed
        );
        assert_eq!(frontier.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_ignored() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/a"), ItemKind::Page);

        let mut lease = frontier.pop().await.unwrap();
        assert!(!lease.advance(ItemState::Parsed));
        assert_eq!(lease.state(), ItemState::Enqueued);
        assert_eq!(frontier.in_flight(), 1);
        lease.failed();
    }

    #[tokio::test]
    async fn test_snapshot_is_none_while_in_flight() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/"), ItemKind::Page);

        assert!(frontier.snapshot().is_none());
        let lease = frontier.pop().await.unwrap();
        assert!(frontier.snapshot().is_none());

        lease.persisted();
        let snapshot = frontier.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["https://example.com/"].state, ItemState::Persisted);
    }

    #[tokio::test]
    async fn test_close_stops_pops_and_pushes() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/a"), ItemKind::Page);
        frontier.push(url("https://example.com/b"), ItemKind::Page);

        let lease = frontier.pop().await.unwrap();
        frontier.close();

        assert!(frontier.is_closed());
        assert!(frontier.pop().await.is_none());
        assert_eq!(
            frontier.push(url("https://example.com/c"), ItemKind::Page),
            PushOutcome::Closed
        );

        // In-flight work finishes normally after close
        assert!(frontier.snapshot().is_none());
        lease.persisted();
        let snapshot = frontier.snapshot().unwrap();
        assert_eq!(snapshot["https://example.com/b"].state, ItemState::Enqueued);
    }

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/"), ItemKind::Page);
        let lease = frontier.pop().await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.pop().await.is_none() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.close();
        assert!(waiter.await.unwrap());
        drop(lease);
    }

    #[tokio::test]
    async fn test_concurrent_pushes_claim_each_url_once() {
        let frontier = Frontier::new(origin());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let frontier = frontier.clone();
            handles.push(tokio::spawn(async move {
                let mut enqueued = 0;
                for i in 0..50 {
                    let u = url(&format!("https://example.com/p{}", i));
                    if frontier.push(u, ItemKind::Page) == PushOutcome::Enqueued {
                        enqueued += 1;
                    }
                }
                enqueued
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert_eq!(total, 50);
        assert_eq!(frontier.visited_count(), 50);
        assert_eq!(frontier.duplicate_rejections(), 7 * 50);
    }

    #[tokio::test]
    async fn test_redirect_target_follows_requested_item() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/old"), ItemKind::Page);
        let lease = frontier.pop().await.unwrap();

        assert_eq!(
            frontier.claim_redirect(lease.url(), &url("https://example.com/new/")),
            PushOutcome::Enqueued
        );
        assert_eq!(
            frontier.push(url("https://example.com/new/"), ItemKind::Page),
            PushOutcome::Duplicate
        );
        assert_eq!(
            lease.redirect_targets(),
            vec![url("https://example.com/new/")]
        );

        lease.persisted();

        let snapshot = frontier.snapshot().unwrap();
        assert_eq!(
            snapshot["https://example.com/new/"],
            VisitRecord {
                kind: ItemKind::Page,
                state: ItemState::Persisted
            }
        );
        assert!(frontier.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_redirect_claim_refuses_foreign_and_claimed_targets() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/a"), ItemKind::Page);
        frontier.push(url("https://example.com/b"), ItemKind::Page);
        let lease = frontier.pop().await.unwrap();
        let gate = frontier.redirect_gate();

        assert!(!gate(lease.url(), &url("https://other.test/a")));
        assert!(!gate(lease.url(), &url("https://example.com/b")));
        assert!(!gate(&url("https://example.com/never-leased"), &url("https://example.com/c")));
        assert!(lease.redirect_targets().is_empty());
        assert_eq!(frontier.scope_rejections(), 1);
        assert_eq!(frontier.duplicate_rejections(), 1);

        assert!(frontier.accepts(&url("https://example.com/c#x")));
        assert!(!frontier.accepts(&url("https://other.test/")));
    }

    #[tokio::test]
    async fn test_dropped_lease_fails_its_redirect_targets() {
        let frontier = Frontier::new(origin());
        frontier.push(url("https://example.com/a"), ItemKind::Asset);
        let lease = frontier.pop().await.unwrap();
        frontier.claim_redirect(lease.url(), &url("https://example.com/b.png"));

        drop(lease);

        let snapshot = frontier.snapshot().unwrap();
        assert_eq!(snapshot["https://example.com/b.png"].state, ItemState::Failed);
        assert_eq!(snapshot["https://example.com/b.png"].kind, ItemKind::Asset);
    }
}
