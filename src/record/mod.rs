//! Canonical record schema and normalization
//!
//! Every marketplace-specific raw listing is mapped into a [`CanonicalRecord`],
//! the single output unit written to the local sink and the webhook sink.

mod domain;
mod normalize;

pub use domain::extract_vendor_domain;
pub use normalize::{parse_rating, parse_review_count, RecordNormalizer};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The marketplaces this harvester knows how to crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marketplace {
    /// Salesforce AppExchange, discovered through its sitemap
    SalesforceAppexchange,

    /// HubSpot Marketplace, discovered through paginated listing pages
    HubspotMarketplace,
}

impl Marketplace {
    /// Stable identifier used in records and output file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SalesforceAppexchange => "salesforce_appexchange",
            Self::HubspotMarketplace => "hubspot_marketplace",
        }
    }

    /// Whether the marketplace exposes vendor email and location
    pub fn exposes_vendor_contact(&self) -> bool {
        matches!(self, Self::SalesforceAppexchange)
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The normalized, marketplace-agnostic output unit
///
/// Optional fields serialize as `null` rather than being omitted, so every
/// record carries the full schema regardless of marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub app_name: String,
    pub vendor_name: String,
    pub vendor_domain: Option<String>,
    pub vendor_website: Option<String>,
    pub vendor_email: Option<String>,
    pub vendor_location: Option<String>,
    pub app_url: String,
    pub description: Option<String>,
    pub categories: Vec<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub marketplace: Marketplace,
    #[serde(with = "scraped_at_format")]
    pub scraped_at: DateTime<Utc>,
}

/// ISO-8601 with an explicit `+00:00` offset
mod scraped_at_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
