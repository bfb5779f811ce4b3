//! Crawler module for marketplace listing discovery and detail fetching
//!
//! This module contains the core crawling logic, including:
//! - Paced HTTP fetching without internal retries
//! - Sitemap and HTML parsing
//! - One discovery strategy per marketplace behind [`MarketplaceCrawler`]
//! - Run orchestration through [`RunController`]

mod coordinator;
mod fetcher;
mod hubspot;
mod pacing;
mod parser;
mod salesforce;

pub use coordinator::{RunController, RunOptions, RunReport};
pub use fetcher::{build_http_client, ExpectedContent, HttpFetcher};
pub use hubspot::{parse_hubspot_detail, parse_listing_page, HubspotCrawler, ListingPage};
pub use pacing::PacingFloor;
pub use parser::{parse_sitemap, resolve_link, SitemapDocument};
pub use salesforce::{extract_window_stores, parse_salesforce_listing, SalesforceCrawler};

use crate::config::Config;
use crate::output::{DeliveryPipeline, JsonFileSink};
use crate::record::Marketplace;
use crate::state::CrawlPhase;
use crate::{HarvestError, ListingError, RunError};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;

/// A discovered but not-yet-fetched pointer to a marketplace listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingReference {
    pub marketplace: Marketplace,
    pub listing_url: String,
}

impl ListingReference {
    pub fn new(marketplace: Marketplace, listing_url: impl Into<String>) -> Self {
        Self {
            marketplace,
            listing_url: listing_url.into(),
        }
    }
}

/// Partially-parsed content of one listing detail page
///
/// Values are kept as the marketplace exposes them (free text for rating and
/// review count); [`crate::RecordNormalizer`] turns them into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub marketplace: Marketplace,
    pub source_url: String,
    pub app_name: Option<String>,
    pub vendor_name: Option<String>,
    pub vendor_website: Option<String>,
    pub vendor_email: Option<String>,
    pub vendor_location: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<String>,
    pub rating: Option<String>,
    pub review_count: Option<String>,
}

impl RawListing {
    /// Creates an empty raw listing for `source_url`
    pub fn new(marketplace: Marketplace, source_url: impl Into<String>) -> Self {
        Self {
            marketplace,
            source_url: source_url.into(),
            app_name: None,
            vendor_name: None,
            vendor_website: None,
            vendor_email: None,
            vendor_location: None,
            description: None,
            categories: Vec::new(),
            rating: None,
            review_count: None,
        }
    }
}

/// One marketplace's discovery and detail-fetch strategy
///
/// Implementations own their [`HttpFetcher`] (and so their pacing floor) and
/// their phase tracker. All calls are sequential.
#[async_trait]
pub trait MarketplaceCrawler: Send {
    /// The marketplace this crawler targets
    fn marketplace(&self) -> Marketplace;

    /// Current crawl phase
    fn phase(&self) -> CrawlPhase;

    /// Discovers listing references in discovery order
    ///
    /// Failure to reach the root of discovery is run-fatal; partial failures
    /// further in are logged and absorbed.
    async fn discover(&mut self) -> Result<Vec<ListingReference>, RunError>;

    /// Fetches and extracts one listing detail page (single attempt)
    async fn fetch_listing(&mut self, reference: &ListingReference)
        -> Result<RawListing, ListingError>;

    /// Marks the crawl as finished
    fn finish(&mut self);
}

/// Result of deduplicating and capping discovered references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// References to fetch, in discovery order
    pub references: Vec<ListingReference>,

    /// Unique references before the cap was applied
    pub unique: usize,

    /// References dropped as duplicates
    pub duplicates: usize,
}

/// Deduplicates references by URL, then keeps the first `limit` (0 = all)
///
/// The first occurrence of a URL wins, and truncation keeps a prefix of
/// discovery order, so the same input always yields the same selection.
pub fn prepare_references(discovered: Vec<ListingReference>, limit: usize) -> Discovery {
    let total = discovered.len();
    let mut seen = HashSet::with_capacity(total);

    let mut references: Vec<ListingReference> = discovered
        .into_iter()
        .filter(|reference| {
            let fresh = seen.insert(reference.listing_url.clone());
            if !fresh {
                tracing::debug!("Dropping duplicate listing {}", reference.listing_url);
            }
            fresh
        })
        .collect();

    let unique = references.len();
    if limit > 0 && references.len() > limit {
        references.truncate(limit);
    }

    Discovery {
        references,
        unique,
        duplicates: total - unique,
    }
}

/// Builds the crawler for a marketplace from configuration
pub fn build_crawler(
    config: &Config,
    marketplace: Marketplace,
    client: Client,
) -> Box<dyn MarketplaceCrawler> {
    match marketplace {
        Marketplace::SalesforceAppexchange => Box::new(SalesforceCrawler::new(
            HttpFetcher::new(client, config.salesforce.pacing()),
            config.salesforce.clone(),
        )),
        Marketplace::HubspotMarketplace => Box::new(HubspotCrawler::new(
            HttpFetcher::new(client, config.hubspot.pacing()),
            config.hubspot.clone(),
            config.crawler.scrape_limit,
        )),
    }
}

/// Runs one complete marketplace harvest
///
/// This is the main entry point for a run. It will:
/// 1. Build the marketplace crawler and its paced fetcher
/// 2. Open the local JSON sink and the webhook delivery pipeline
/// 3. Discover, deduplicate and cap listing references
/// 4. Fetch, normalize and fan out each listing
/// 5. Flush the pipeline and write the local file
///
/// # Returns
///
/// * `Ok(RunReport)` - Run completed (possibly with skips)
/// * `Err(HarvestError)` - Discovery failed or the local file could not be written
pub async fn run_marketplace(
    config: &Config,
    marketplace: Marketplace,
) -> Result<RunReport, HarvestError> {
    let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;

    let crawler = build_crawler(config, marketplace, client.clone());
    let sink = JsonFileSink::new(&config.output.directory, marketplace);
    let pipeline = DeliveryPipeline::new(
        client,
        config.webhook.url.clone(),
        config.webhook.batch_size,
        config.webhook.batch_delay(),
    );

    let options = RunOptions {
        scrape_limit: config.crawler.scrape_limit,
        progress_interval: config.crawler.progress_interval,
    };

    RunController::new(crawler, sink, pipeline, options).run().await
}
