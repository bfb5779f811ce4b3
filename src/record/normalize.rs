//! Raw listing → canonical record mapping
//!
//! Normalization rules:
//! - `app_name`, `vendor_name` and `app_url` are required
//! - `vendor_domain` is derived from `vendor_website`; failure yields `None`
//! - rating and review count are parsed from free text; failure yields `None`
//! - categories keep source order and drop exact duplicates
//! - `scraped_at` is always assigned here, in UTC
//! - vendor email/location are forced to `None` for marketplaces that do not
//!   expose them

use crate::crawler::RawListing;
use crate::record::{extract_vendor_domain, CanonicalRecord};
use crate::NormalizationError;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Maps raw per-marketplace listings into [`CanonicalRecord`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes a raw listing, stamping it with the current time
    ///
    /// # Returns
    ///
    /// * `Ok(CanonicalRecord)` - The normalized record
    /// * `Err(NormalizationError)` - A required field was missing; the caller
    ///   skips the listing
    pub fn normalize(&self, raw: &RawListing) -> Result<CanonicalRecord, NormalizationError> {
        self.normalize_at(raw, Utc::now())
    }

    /// Normalizes a raw listing with an explicit `scraped_at`
    ///
    /// Identical inputs produce identical records.
    pub fn normalize_at(
        &self,
        raw: &RawListing,
        scraped_at: DateTime<Utc>,
    ) -> Result<CanonicalRecord, NormalizationError> {
        let app_url = clean_text(Some(&raw.source_url)).ok_or_else(|| missing("app_url", raw))?;
        let app_name = clean_name(raw.app_name.as_deref()).ok_or_else(|| missing("app_name", raw))?;
        let vendor_name =
            clean_name(raw.vendor_name.as_deref()).ok_or_else(|| missing("vendor_name", raw))?;

        let vendor_website = clean_text(raw.vendor_website.as_deref());
        let vendor_domain = extract_vendor_domain(vendor_website.as_deref());

        let (vendor_email, vendor_location) = if raw.marketplace.exposes_vendor_contact() {
            (
                clean_text(raw.vendor_email.as_deref()),
                clean_name(raw.vendor_location.as_deref()),
            )
        } else {
            (None, None)
        };

        Ok(CanonicalRecord {
            app_name,
            vendor_name,
            vendor_domain,
            vendor_website,
            vendor_email,
            vendor_location,
            app_url,
            description: clean_text(raw.description.as_deref()),
            categories: dedup_categories(&raw.categories),
            rating: raw.rating.as_deref().and_then(parse_rating),
            review_count: raw.review_count.as_deref().and_then(parse_review_count),
            marketplace: raw.marketplace,
            scraped_at,
        })
    }
}

fn missing(field: &'static str, raw: &RawListing) -> NormalizationError {
    NormalizationError::MissingRequiredField {
        field,
        url: raw.source_url.clone(),
    }
}

/// Trims a value, mapping blank strings to `None`
fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Like [`clean_text`] but also collapses internal whitespace runs
fn clean_name(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|v| !v.is_empty())
}

/// Drops blank entries and exact repeats; values are kept as given
fn dedup_categories(categories: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    categories
        .iter()
        .filter(|c| !c.trim().is_empty())
        .filter(|c| seen.insert(c.as_str()))
        .cloned()
        .collect()
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid rating regex"))
}

fn count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,]*").expect("valid count regex"))
}

/// Parses a rating from free text such as `"4.5 out of 5"`
///
/// The first number in the text is taken; values outside 0..=5 are rejected.
pub fn parse_rating(text: &str) -> Option<f64> {
    let rating: f64 = number_regex().find(text)?.as_str().parse().ok()?;
    (0.0..=5.0).contains(&rating).then_some(rating)
}

/// Parses a review count from free text such as `"1,234 reviews"`
pub fn parse_review_count(text: &str) -> Option<u64> {
    let digits: String = count_regex()
        .find(text)?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
