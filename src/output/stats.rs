//! Crawl statistics
//!
//! Each worker keeps its own tally while the crawl runs; tallies are merged
//! once the pool has joined, together with the frontier's rejection counters
//! and the final state of every visited URL.

use crate::crawler::VisitedSnapshot;
use crate::state::ItemState;
use std::collections::HashMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Pages written to the mirror
    pub pages_saved: u64,

    /// Assets written to the mirror
    pub assets_saved: u64,

    /// Assets left in place from a previous run
    pub assets_reused: u64,

    /// Responses with a non-2xx status
    pub bad_status: u64,

    /// Timeouts, connection and TLS failures
    pub transport_failures: u64,

    /// Redirects not followed because they lead outside the origin
    pub offsite_redirects: u64,

    /// Redirects not followed because their target was already claimed
    pub duplicate_redirects: u64,

    /// Bodies that could not be written
    pub persistence_failures: u64,

    /// HTML pages that yielded no links
    pub parse_degradations: u64,

    /// Links rejected for falling outside the origin
    pub scope_rejections: u64,

    /// Links rejected because they were already claimed
    pub duplicate_rejections: u64,

    /// Total response bytes written
    pub bytes_written: u64,

    /// Final state of every visited URL
    pub items_by_state: HashMap<ItemState, u64>,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Adds another tally into this one
    pub fn merge(&mut self, other: &CrawlStatistics) {
        self.pages_saved += other.pages_saved;
        self.assets_saved += other.assets_saved;
        self.assets_reused += other.assets_reused;
        self.bad_status += other.bad_status;
        self.transport_failures += other.transport_failures;
        self.offsite_redirects += other.offsite_redirects;
        self.duplicate_redirects += other.duplicate_redirects;
        self.persistence_failures += other.persistence_failures;
        self.parse_degradations += other.parse_degradations;
        self.scope_rejections += other.scope_rejections;
        self.duplicate_rejections += other.duplicate_rejections;
        self.bytes_written += other.bytes_written;

        for (state, count) in &other.items_by_state {
            *self.items_by_state.entry(*state).or_insert(0) += count;
        }
    }

    /// Counts the final state of every visited URL
    pub fn record_snapshot(&mut self, snapshot: &VisitedSnapshot) {
        self.items_by_state.clear();
        for record in snapshot.values() {
            *self.items_by_state.entry(record.state).or_insert(0) += 1;
        }
    }

    /// Number of distinct URLs the crawl claimed
    pub fn total_visited(&self) -> u64 {
        self.items_by_state.values().sum()
    }

    /// Number of fetches or writes that failed
    pub fn total_failures(&self) -> u64 {
        self.bad_status
            + self.transport_failures
            + self.offsite_redirects
            + self.persistence_failures
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  URLs visited: {}", stats.total_visited());
    println!("  Pages saved: {}", stats.pages_saved);
    println!(
        "  Assets saved: {} ({} reused from a previous run)",
        stats.assets_saved, stats.assets_reused
    );
    println!("  Bytes written: {}", stats.bytes_written);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    println!("Items by State:");
    let mut state_counts: Vec<_> = stats.items_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    let total = stats.total_visited();
    for (state, count) in state_counts {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if stats.total_failures() > 0 || stats.parse_degradations > 0 {
        println!("Error Summary:");
        println!("  Bad status: {}", stats.bad_status);
        println!("  Transport failures: {}", stats.transport_failures);
        println!("  Off-site redirects: {}", stats.offsite_redirects);
        println!("  Persistence failures: {}", stats.persistence_failures);
        println!("  Pages without links: {}", stats.parse_degradations);
        println!();
    }

    println!("Rejected Links:");
    println!("  Out of scope: {}", stats.scope_rejections);
    println!("  Duplicates: {}", stats.duplicate_rejections);
    println!("  Redirects to claimed URLs: {}", stats.duplicate_redirects);
}
