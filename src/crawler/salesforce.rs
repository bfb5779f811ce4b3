//! Salesforce AppExchange crawler (sitemap-based discovery)
//!
//! Discovery fetches the root sitemap, then every child sitemap it lists, and
//! keeps the URLs matching the listing pattern. Detail pages embed the listing
//! as a JSON object assigned to `window.stores`.

use crate::config::SalesforceConfig;
use crate::crawler::fetcher::{ExpectedContent, HttpFetcher};
use crate::crawler::parser::parse_sitemap;
use crate::crawler::{ListingReference, MarketplaceCrawler, RawListing};
use crate::record::Marketplace;
use crate::state::{CrawlPhase, PhaseTracker};
use crate::{ListingError, RunError};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;

/// Sitemap-walking crawler for Salesforce AppExchange
pub struct SalesforceCrawler {
    fetcher: HttpFetcher,
    config: SalesforceConfig,
    phase: PhaseTracker,
}

impl SalesforceCrawler {
    pub fn new(fetcher: HttpFetcher, config: SalesforceConfig) -> Self {
        Self {
            fetcher,
            config,
            phase: PhaseTracker::new(),
        }
    }

    fn is_listing_url(&self, url: &str) -> bool {
        self.config.listing_url_pattern.is_empty() || url.contains(&self.config.listing_url_pattern)
    }

    fn collect_listings(&self, urls: &[String], into: &mut Vec<ListingReference>) -> usize {
        let before = into.len();
        into.extend(
            urls.iter()
                .filter(|url| self.is_listing_url(url))
                .map(|url| ListingReference::new(Marketplace::SalesforceAppexchange, url.clone())),
        );
        into.len() - before
    }

    fn discovery_failed(&mut self, reason: String) -> RunError {
        tracing::error!("Sitemap discovery failed: {}", reason);
        self.phase.advance(CrawlPhase::Done);
        RunError::DiscoveryFailed {
            marketplace: Marketplace::SalesforceAppexchange,
            reason,
        }
    }
}

#[async_trait]
impl MarketplaceCrawler for SalesforceCrawler {
    fn marketplace(&self) -> Marketplace {
        Marketplace::SalesforceAppexchange
    }

    fn phase(&self) -> CrawlPhase {
        self.phase.current()
    }

    async fn discover(&mut self) -> Result<Vec<ListingReference>, RunError> {
        self.phase.advance(CrawlPhase::FetchSitemapIndex);

        let index_url = self.config.sitemap_url.clone();
        tracing::info!("Fetching sitemap index from {}", index_url);

        let body = match self.fetcher.fetch(&index_url, ExpectedContent::Xml).await {
            Ok(body) => body,
            Err(e) => return Err(self.discovery_failed(e.to_string())),
        };

        let root = parse_sitemap(&body);
        if root.is_empty() {
            return Err(self.discovery_failed(format!(
                "root sitemap {} contained no readable entries",
                index_url
            )));
        }

        // A plain url set is its own single page
        let mut references = Vec::new();
        self.collect_listings(&root.urls, &mut references);

        self.phase.advance(CrawlPhase::FetchSitemapPages);

        let mut pending: VecDeque<String> = root.sitemaps.into_iter().collect();
        let mut visited: HashSet<String> = HashSet::from([index_url]);
        let mut skipped_children = 0usize;

        while let Some(child_url) = pending.pop_front() {
            if !visited.insert(child_url.clone()) {
                continue;
            }

            let body = match self.fetcher.fetch(&child_url, ExpectedContent::Xml).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Skipping child sitemap {}: {}", child_url, e);
                    skipped_children += 1;
                    continue;
                }
            };

            let child = parse_sitemap(&body);
            let found = self.collect_listings(&child.urls, &mut references);
            tracing::info!("Sitemap {}: {} listing URLs", child_url, found);

            // Nested indexes are walked after the current level
            pending.extend(child.sitemaps);
        }

        tracing::info!(
            "Found {} listing URLs in sitemap ({} child sitemaps skipped)",
            references.len(),
            skipped_children
        );

        self.phase.advance(CrawlPhase::FetchListingDetail);
        Ok(references)
    }

    async fn fetch_listing(
        &mut self,
        reference: &ListingReference,
    ) -> Result<RawListing, ListingError> {
        let body = self
            .fetcher
            .fetch(&reference.listing_url, ExpectedContent::Html)
            .await?;

        let stores = extract_window_stores(&body).ok_or_else(|| ListingError::Extract {
            url: reference.listing_url.clone(),
            message: "no window.stores payload".to_string(),
        })?;

        parse_salesforce_listing(&stores, &reference.listing_url).ok_or_else(|| {
            ListingError::Extract {
                url: reference.listing_url.clone(),
                message: "window.stores has no LISTING.listing object".to_string(),
            }
        })
    }

    fn finish(&mut self) {
        self.phase.finish();
    }
}

fn stores_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)window\.stores\s*=\s*(\{.*?\});\s*(?:window\.|</script>)")
            .expect("valid window.stores regex")
    })
}

/// Extracts the JSON object assigned to `window.stores` in a detail page
pub fn extract_window_stores(html: &str) -> Option<Value> {
    let captures = stores_regex().captures(html)?;
    match serde_json::from_str(captures.get(1)?.as_str()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Failed to parse window.stores JSON: {}", e);
            None
        }
    }
}

/// Maps the `LISTING.listing` object of a `window.stores` payload
///
/// Returns None when the payload carries no listing object.
pub fn parse_salesforce_listing(stores: &Value, url: &str) -> Option<RawListing> {
    let listing = stores.pointer("/LISTING/listing").filter(|v| v.is_object())?;
    let publisher = listing.get("publisher");

    let mut categories = listing_categories(listing);
    if categories.is_empty() {
        if let Some(app_type) = string_field(Some(listing), "appType") {
            categories.push(app_type);
        }
    }

    let reviews = listing.get("reviewsSummary");

    Some(RawListing {
        app_name: string_field(Some(listing), "name"),
        vendor_name: string_field(publisher, "name"),
        vendor_website: string_field(publisher, "website"),
        vendor_email: string_field(publisher, "email"),
        vendor_location: string_field(publisher, "hQLocation"),
        description: string_field(Some(listing), "description"),
        categories,
        rating: scalar_text(reviews.and_then(|r| r.get("averageRating"))),
        review_count: scalar_text(reviews.and_then(|r| r.get("reviewCount"))),
        ..RawListing::new(Marketplace::SalesforceAppexchange, url)
    })
}

/// Categories from `extensions[].data.listingCategories[]`
fn listing_categories(listing: &Value) -> Vec<String> {
    listing
        .get("extensions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|ext| ext.pointer("/data/listingCategories").and_then(Value::as_array))
        .flatten()
        .filter_map(|category| match category {
            Value::String(name) => Some(name.clone()),
            Value::Object(_) => string_field(Some(category), "name"),
            _ => None,
        })
        .collect()
}

fn string_field(object: Option<&Value>, key: &str) -> Option<String> {
    object?.get(key)?.as_str().map(str::to_string)
}

/// Renders a JSON number or string as text for the normalizer
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
