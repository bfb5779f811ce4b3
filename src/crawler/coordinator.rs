//! Run controller - one marketplace run from discovery to summary
//!
//! This module contains the main run loop that coordinates:
//! - Discovery through the marketplace crawler
//! - Deduplication and the scrape limit
//! - Sequential detail fetching and normalization
//! - Fan-out to the local sink and the webhook pipeline
//! - Final flush and statistics

use crate::crawler::{prepare_references, ListingReference, MarketplaceCrawler};
use crate::output::{DeliveryPipeline, RecordSink, RunStats};
use crate::record::{Marketplace, RecordNormalizer};
use crate::{HarvestError, OutputError};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Per-run knobs taken from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum listings to fetch (0 = unlimited)
    pub scrape_limit: usize,

    /// Log progress every N processed listings
    pub progress_interval: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            scrape_limit: 0,
            progress_interval: 50,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub marketplace: Marketplace,
    pub stats: RunStats,

    /// Local file holding the run's records
    pub output_path: PathBuf,

    pub elapsed: Duration,
}

/// Orchestrates a single marketplace run
pub struct RunController<S: RecordSink> {
    crawler: Box<dyn MarketplaceCrawler>,
    normalizer: RecordNormalizer,
    sink: S,
    pipeline: DeliveryPipeline,
    options: RunOptions,
}

impl<S: RecordSink> RunController<S> {
    pub fn new(
        crawler: Box<dyn MarketplaceCrawler>,
        sink: S,
        pipeline: DeliveryPipeline,
        options: RunOptions,
    ) -> Self {
        Self {
            crawler,
            normalizer: RecordNormalizer::new(),
            sink,
            pipeline,
            options,
        }
    }

    /// Runs the marketplace to completion
    ///
    /// The run:
    /// 1. Discovers listing references (failure aborts before any output)
    /// 2. Deduplicates and applies the scrape limit
    /// 3. Fetches, normalizes and fans out each listing, skipping failures
    /// 4. Flushes the webhook pipeline exactly once
    /// 5. Writes the local file
    pub async fn run(self) -> Result<RunReport, HarvestError> {
        let Self {
            mut crawler,
            normalizer,
            mut sink,
            mut pipeline,
            options,
        } = self;

        let marketplace = crawler.marketplace();
        let start_time = Instant::now();
        let mut stats = RunStats::new();

        tracing::info!("Starting {} run", marketplace);

        let discovered = match crawler.discover().await {
            Ok(references) => references,
            Err(e) => {
                // Nothing was pushed, but the flush contract still holds
                pipeline.flush().await;
                crawler.finish();
                tracing::error!("{} run aborted: {}", marketplace, e);
                return Err(e.into());
            }
        };

        let discovery = prepare_references(discovered, options.scrape_limit);
        stats.discovered = discovery.unique as u64;

        if discovery.duplicates > 0 {
            tracing::info!("Dropped {} duplicate listing URLs", discovery.duplicates);
        }
        if discovery.references.len() < discovery.unique {
            tracing::info!(
                "Scrape limit {} applied: fetching {} of {} listings",
                options.scrape_limit,
                discovery.references.len(),
                discovery.unique
            );
        }
        tracing::debug!("Crawler phase: {}", crawler.phase());

        let outcome = process_references(
            crawler.as_mut(),
            &normalizer,
            &mut sink,
            &mut pipeline,
            &discovery.references,
            options,
            &mut stats,
        )
        .await;

        stats.record_delivery(pipeline.flush().await);
        crawler.finish();

        if let Err(e) = outcome {
            tracing::error!("Local sink failed: {}", e);
            return Err(e.into());
        }

        let output_path = sink.finish()?;
        let elapsed = start_time.elapsed();

        tracing::info!(
            "{} run completed in {:.1}s: {}",
            marketplace,
            elapsed.as_secs_f64(),
            stats
        );

        Ok(RunReport {
            marketplace,
            stats,
            output_path,
            elapsed,
        })
    }
}

/// Fetches and fans out each reference in order
///
/// Fetch, extraction and normalization failures are skips. Only a local sink
/// failure ends the loop early.
async fn process_references<S: RecordSink>(
    crawler: &mut dyn MarketplaceCrawler,
    normalizer: &RecordNormalizer,
    sink: &mut S,
    pipeline: &mut DeliveryPipeline,
    references: &[ListingReference],
    options: RunOptions,
    stats: &mut RunStats,
) -> Result<(), OutputError> {
    let total = references.len();
    let mut seen_app_urls = HashSet::with_capacity(total);

    for (index, reference) in references.iter().enumerate() {
        match crawler.fetch_listing(reference).await {
            Ok(raw) => {
                stats.fetched += 1;

                match normalizer.normalize(&raw) {
                    Ok(record) => {
                        if seen_app_urls.insert(record.app_url.clone()) {
                            sink.write(&record)?;
                            stats.normalized += 1;
                            pipeline.push(record).await;
                        } else {
                            // First discovered wins
                            tracing::warn!("Skipping duplicate record for {}", record.app_url);
                            stats.skipped += 1;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Skipping listing: {}", e);
                        stats.skipped += 1;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", reference.listing_url, e);
                stats.skipped += 1;
            }
        }

        let processed = index + 1;
        if options.progress_interval > 0 && processed % options.progress_interval == 0 {
            tracing::info!(
                "Progress: {}/{} listings processed, {} records",
                processed,
                total,
                stats.normalized
            );
        }
    }

    Ok(())
}
