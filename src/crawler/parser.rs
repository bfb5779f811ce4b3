//! Shared document parsing helpers
//!
//! This module handles parsing of the documents both crawlers see:
//! - Sitemap documents (index or url set)
//! - HTML pages: titles, meta tags, element text and link resolution

use scraper::{ElementRef, Html, Selector};
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;
use url::Url;

/// Entries found in one sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Child sitemap locations (only present in a sitemap index)
    pub sitemaps: Vec<String>,

    /// Page locations, in document order
    pub urls: Vec<String>,

    /// Entries that could not be read
    pub errors: usize,
}

impl SitemapDocument {
    /// Returns true if no usable entry was found
    pub fn is_empty(&self) -> bool {
        self.sitemaps.is_empty() && self.urls.is_empty()
    }
}

/// Parses a sitemap or sitemap index
///
/// Both `<sitemap><loc>` and `<url><loc>` entries are collected, in document
/// order. Parsing stops at the first XML error; entries read before it are kept.
///
/// # Example
///
/// ```
/// use listing_harvester::crawler::parse_sitemap;
///
/// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/a</loc></url>
/// </urlset>"#;
/// let doc = parse_sitemap(xml);
/// assert_eq!(doc.urls, vec!["https://example.com/a".to_string()]);
/// ```
pub fn parse_sitemap(xml: &str) -> SitemapDocument {
    let mut document = SitemapDocument::default();
    let reader = SiteMapReader::new(Cursor::new(xml.as_bytes()));

    for entity in reader {
        match entity {
            SiteMapEntity::Url(url_entry) => {
                if let Some(url) = url_entry.loc.get_url() {
                    document.urls.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(sitemap_entry) => {
                if let Some(url) = sitemap_entry.loc.get_url() {
                    document.sitemaps.push(url.to_string());
                }
            }
            SiteMapEntity::Err(e) => {
                // The XML reader keeps returning the same error once it fails
                tracing::debug!("Sitemap parse stopped: {}", e);
                document.errors += 1;
                break;
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    document
}

/// Extracts the page title from the HTML document
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|s| !s.is_empty())
}

/// Returns the `content` attribute of the first element matching `selector`
pub fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

/// Returns the text of the first element matching `selector` that has any
pub fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .map(|element| element_text(&element))
        .find(|text| !text.is_empty())
}

/// Collects the whitespace-normalized text of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}
