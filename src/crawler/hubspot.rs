//! HubSpot Marketplace crawler (pagination-based discovery)
//!
//! Listing pages are walked from page 1 until a stop signal. Detail pages
//! are plain HTML and are read with selector heuristics; HubSpot exposes no
//! vendor email or location, so those stay empty.

use crate::config::HubspotConfig;
use crate::crawler::fetcher::{ExpectedContent, HttpFetcher};
use crate::crawler::parser::{element_text, extract_title, first_text, meta_content, resolve_link};
use crate::crawler::{ListingReference, MarketplaceCrawler, RawListing};
use crate::record::{parse_rating, Marketplace};
use crate::state::{CrawlPhase, PhaseTracker};
use crate::{ListingError, RunError};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// `/marketplace/apps/<slug>` pages that are collections rather than apps
const SKIPPED_APP_SLUGS: &[&str] = &[
    "all",
    "all-categories",
    "popular",
    "new",
    "free",
    "featured",
    "cms",
    "ecommerce",
];

const SKIPPED_APP_SLUG_PREFIXES: &[&str] = &["apps-for-", "apps-built-for-"];

const VENDOR_SELECTORS: &[&str] = &[
    r#"[class*="vendor"]"#,
    r#"[class*="provider"]"#,
    r#"[class*="company"]"#,
    r#"[class*="author"]"#,
    r#"[data-testid*="vendor"]"#,
    r#"[data-testid*="provider"]"#,
];

const RATING_SELECTORS: &[&str] = &[
    r#"[class*="rating"]"#,
    r#"[class*="stars"]"#,
    r#"[aria-label*="rating"]"#,
];

const CATEGORY_SELECTORS: &[&str] = &[
    r#"[class*="category"]"#,
    r#"[class*="tag"]"#,
    r#"a[href*="/marketplace/apps/"][href*="category"]"#,
];

/// Listing references found on one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Absolute listing URLs, in page order, without duplicates
    pub references: Vec<String>,

    /// Whether the page carries an explicit `rel="next"` link
    pub has_next_marker: bool,
}

/// Paginated crawler for the HubSpot App Marketplace
pub struct HubspotCrawler {
    fetcher: HttpFetcher,
    config: HubspotConfig,
    scrape_limit: usize,
    phase: PhaseTracker,
}

impl HubspotCrawler {
    pub fn new(fetcher: HttpFetcher, config: HubspotConfig, scrape_limit: usize) -> Self {
        Self {
            fetcher,
            config,
            scrape_limit,
            phase: PhaseTracker::new(),
        }
    }

    /// URL of listing page `page` (1-based)
    ///
    /// Page 1 is the configured listing URL unchanged; later pages carry the
    /// page parameter, replacing any value already present.
    pub fn page_url(&self, page: u32) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.config.listing_url)?;
        if page <= 1 {
            return Ok(url);
        }

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != self.config.page_param.as_str())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair(&self.config.page_param, &page.to_string());

        Ok(url)
    }

    fn discovery_failed(&mut self, reason: String) -> RunError {
        tracing::error!("Listing page discovery failed: {}", reason);
        self.phase.advance(CrawlPhase::Done);
        RunError::DiscoveryFailed {
            marketplace: Marketplace::HubspotMarketplace,
            reason,
        }
    }
}

#[async_trait]
impl MarketplaceCrawler for HubspotCrawler {
    fn marketplace(&self) -> Marketplace {
        Marketplace::HubspotMarketplace
    }

    fn phase(&self) -> CrawlPhase {
        self.phase.current()
    }

    async fn discover(&mut self) -> Result<Vec<ListingReference>, RunError> {
        let mut references = Vec::new();
        let mut seen = HashSet::new();
        let max_pages = self.config.max_pages;

        for page in 1..=max_pages {
            self.phase.advance(CrawlPhase::FetchListingPage(page));

            let page_url = match self.page_url(page) {
                Ok(url) => url,
                Err(e) => {
                    return Err(self.discovery_failed(format!(
                        "invalid listing URL {}: {}",
                        self.config.listing_url, e
                    )))
                }
            };

            tracing::info!("Loading page {}/{}: {}", page, max_pages, page_url);

            let body = match self.fetcher.fetch(page_url.as_str(), ExpectedContent::Html).await {
                Ok(body) => body,
                Err(e) if page == 1 => return Err(self.discovery_failed(e.to_string())),
                Err(e) => {
                    tracing::warn!("Stopping pagination after page {} failed: {}", page, e);
                    break;
                }
            };

            let listing_page = parse_listing_page(&body, &page_url);
            let found = listing_page.references.len();
            let mut new = 0;
            for listing_url in listing_page.references {
                if seen.insert(listing_url.clone()) {
                    references.push(ListingReference::new(
                        Marketplace::HubspotMarketplace,
                        listing_url,
                    ));
                    new += 1;
                }
            }

            tracing::info!(
                "Page {}: found {} new listings (total: {})",
                page,
                new,
                references.len()
            );

            if self.scrape_limit > 0 && references.len() >= self.scrape_limit {
                tracing::info!("Reached scrape limit of {} listings", self.scrape_limit);
                break;
            }

            if !page_has_more(found, new, listing_page.has_next_marker, self.config.page_size) {
                tracing::info!("No more listing pages after page {}", page);
                break;
            }

            if page == max_pages {
                tracing::info!("Reached max pages ({})", max_pages);
            }
        }

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

        Ok(parse_hubspot_detail(&body, &reference.listing_url))
    }

    fn finish(&mut self) {
        self.phase.finish();
    }
}

/// Decides whether another listing page should be requested
///
/// # Arguments
///
/// * `found` - References on the page just read
/// * `new` - Of those, references not seen on earlier pages
/// * `has_next_marker` - The page carried a `rel="next"` link
/// * `page_size` - Expected references per full page (0 = unknown)
pub fn page_has_more(found: usize, new: usize, has_next_marker: bool, page_size: usize) -> bool {
    if found == 0 {
        false
    } else if has_next_marker {
        true
    } else if page_size > 0 {
        found >= page_size
    } else {
        new > 0
    }
}

/// Extracts listing references from a listing page
///
/// Sources are read in order: JSON-LD `ItemList` entries, `/marketplace/listing/`
/// anchors, then `/marketplace/apps/<slug>` anchors that are not collection pages.
pub fn parse_listing_page(html: &str, page_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let mut page = ListingPage::default();
    let mut seen = HashSet::new();

    let mut add = |url: String, page: &mut ListingPage| {
        if seen.insert(url.clone()) {
            page.references.push(url);
        }
    };

    for id in json_ld_listing_ids(&document) {
        if let Some(url) = resolve_link(&id, page_url) {
            add(url, &mut page);
        }
    }

    for href in anchor_hrefs(&document, r#"a[href*="/marketplace/listing/"]"#) {
        if let Some(url) = resolve_link(&href, page_url) {
            add(url, &mut page);
        }
    }

    for href in anchor_hrefs(&document, r#"a[href*="/marketplace/apps/"]"#) {
        if !is_app_detail_path(&href) {
            continue;
        }
        if let Some(url) = resolve_link(&href, page_url) {
            add(url, &mut page);
        }
    }

    if let Ok(next) = Selector::parse(r#"link[rel="next"], a[rel="next"]"#) {
        page.has_next_marker = document.select(&next).next().is_some();
    }

    page
}

/// `@id`s of JSON-LD `ItemList` entries pointing at listing pages
fn json_ld_listing_ids(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut ids = Vec::new();
    for script in document.select(&selector) {
        let content: String = script.text().collect();
        let data: Value = match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Ignoring unparsable JSON-LD block: {}", e);
                continue;
            }
        };

        let blocks = match data {
            Value::Array(blocks) => blocks,
            block => vec![block],
        };

        for block in blocks.iter().filter(|b| b["@type"] == "ItemList") {
            let items = block["itemListElement"].as_array().into_iter().flatten();
            ids.extend(
                items
                    .filter_map(|item| item["item"]["@id"].as_str())
                    .filter(|id| id.contains("/marketplace/listing/"))
                    .map(str::to_string),
            );
        }
    }

    ids
}

/// Hrefs of anchors matching `selector`, minus filtered or anchored links
fn anchor_hrefs(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !href.contains('?') && !href.contains('#'))
        .map(str::to_string)
        .collect()
}

/// True when an `/apps/` href names a single app rather than a collection
fn is_app_detail_path(href: &str) -> bool {
    let mut segments = href.trim_end_matches('/').split('/');
    if segments.by_ref().find(|s| *s == "apps").is_none() {
        return false;
    }

    match segments.next() {
        Some(slug) if !slug.is_empty() => {
            !SKIPPED_APP_SLUGS.contains(&slug)
                && !SKIPPED_APP_SLUG_PREFIXES.iter().any(|p| slug.starts_with(p))
        }
        _ => false,
    }
}

fn title_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*[|–-]\s*HubSpot.*$").expect("valid title suffix regex"))
}

fn by_vendor_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:by|By|BY)\s+([A-Z][A-Za-z0-9\s&.,]+?)(?:<|$|\n)")
            .expect("valid vendor regex")
    })
}

fn review_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d,]*)\s*(?:reviews?|ratings?)\b").expect("valid review regex")
    })
}

/// Reads a HubSpot listing detail page with selector heuristics
///
/// Missing values stay `None`; the normalizer decides whether the result is
/// usable.
pub fn parse_hubspot_detail(html: &str, url: &str) -> RawListing {
    let document = Html::parse_document(html);
    let mut raw = RawListing::new(Marketplace::HubspotMarketplace, url);

    raw.app_name = first_text(&document, "h1").or_else(|| {
        extract_title(&document)
            .map(|title| title_suffix_regex().replace(&title, "").trim().to_string())
            .filter(|name| !name.is_empty())
    });

    raw.description = meta_content(&document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(&document, r#"meta[property="og:description"]"#));

    raw.vendor_name = first_match_text(&document, VENDOR_SELECTORS, |text| text.chars().count() < 100)
        .or_else(|| {
            by_vendor_regex()
                .captures(html)
                .map(|c| c[1].trim().to_string())
                .filter(|vendor| !vendor.is_empty() && vendor.chars().count() < 50)
        });

    raw.rating = first_match_text(&document, RATING_SELECTORS, |text| parse_rating(text).is_some());

    raw.review_count = review_count_regex()
        .captures(html)
        .map(|c| c[1].to_string());

    raw.categories = category_texts(&document);

    raw
}

/// Text of the first element of each selector, returning the first accepted
fn first_match_text(
    document: &Html,
    selectors: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .filter_map(|selector| document.select(&selector).next().map(|e| element_text(&e)))
        .find(|text| !text.is_empty() && accept(text))
}

/// Up to five short texts per category selector, without duplicates
fn category_texts(document: &Html) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();

    for selector in CATEGORY_SELECTORS.iter().filter_map(|s| Selector::parse(s).ok()) {
        for element in document.select(&selector).take(5) {
            let text = element_text(&element);
            if !text.is_empty() && text.chars().count() < 50 && !categories.contains(&text) {
                categories.push(text);
            }
        }
    }

    categories
}
