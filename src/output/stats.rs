//! Run statistics
//!
//! Counters accumulated by the run controller and reported at run end.

use crate::output::DeliveryStats;
use std::fmt;

/// Counters for one marketplace run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Unique listing references found by discovery (before the scrape limit)
    pub discovered: u64,

    /// Detail pages fetched and extracted
    pub fetched: u64,

    /// Records produced by the normalizer and written out
    pub normalized: u64,

    /// Listings dropped by a fetch, extraction or normalization failure, or
    /// as a duplicate record
    pub skipped: u64,

    /// Records accepted by the webhook
    pub webhook_sent: u64,

    /// Records in webhook batches that failed
    pub webhook_failed: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the delivery pipeline's counters into the run
    pub fn record_delivery(&mut self, delivery: DeliveryStats) {
        self.webhook_sent += delivery.sent;
        self.webhook_failed += delivery.failed;
    }

    /// Listings whose detail page was attempted
    pub fn attempted(&self) -> u64 {
        self.normalized + self.skipped
    }

    /// Returns the success rate as a percentage of attempted listings
    pub fn success_rate(&self) -> f64 {
        let attempted = self.attempted();
        if attempted == 0 {
            return 0.0;
        }
        (self.normalized as f64 / attempted as f64) * 100.0
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discovered={} fetched={} normalized={} skipped={} webhook_sent={} webhook_failed={}",
            self.discovered,
            self.fetched,
            self.normalized,
            self.skipped,
            self.webhook_sent,
            self.webhook_failed
        )
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `label` - Heading for the block (usually the marketplace)
/// * `stats` - The statistics to display
pub fn print_statistics(label: &str, stats: &RunStats) {
    println!("=== Run Statistics: {} ===\n", label);

    println!("Listings:");
    println!("  Discovered: {}", stats.discovered);
    println!("  Fetched: {}", stats.fetched);
    println!("  Normalized: {}", stats.normalized);
    println!("  Skipped: {}", stats.skipped);
    println!();

    println!("Webhook:");
    println!("  Sent: {}", stats.webhook_sent);
    println!("  Failed: {}", stats.webhook_failed);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} listings normalized)",
        stats.success_rate(),
        stats.normalized,
        stats.attempted()
    );
}
