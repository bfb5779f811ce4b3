use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Listing-Harvester
///
/// Every section has defaults so the harvester runs without a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub webhook: WebhookConfig,
    pub salesforce: SalesforceConfig,
    pub hubspot: HubspotConfig,
}

/// Crawl behavior shared by both marketplaces
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Global cap on listings per run (0 = unlimited)
    #[serde(rename = "scrape-limit")]
    pub scrape_limit: usize,

    /// Timeout applied to every outbound request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Log progress every N processed listings
    #[serde(rename = "progress-interval")]
    pub progress_interval: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            scrape_limit: 0,
            request_timeout_secs: 30,
            progress_interval: 50,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ListingHarvester".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/listing-harvester".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

/// Local durable sink configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `{marketplace}_{YYYYMMDDHHMMSS}.json`
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}

/// Webhook sink configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Endpoint receiving JSON batches; delivery is disabled when absent
    pub url: Option<String>,

    /// Records per POST
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Pacing floor between batch sends (milliseconds)
    #[serde(rename = "batch-delay-ms")]
    pub batch_delay_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            batch_size: 100,
            batch_delay_ms: 500,
        }
    }
}

impl WebhookConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Salesforce AppExchange (sitemap-based discovery)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SalesforceConfig {
    /// Root sitemap document (index or url set)
    #[serde(rename = "sitemap-url")]
    pub sitemap_url: String,

    /// Substring a sitemap URL must contain to count as a listing (empty = all)
    #[serde(rename = "listing-url-pattern")]
    pub listing_url_pattern: String,

    /// Pacing floor between requests (milliseconds)
    #[serde(rename = "pacing-ms")]
    pub pacing_ms: u64,
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            sitemap_url: "https://appexchange.salesforce.com/sitemap.xml".to_string(),
            listing_url_pattern: "appxListingDetail".to_string(),
            pacing_ms: 1500,
        }
    }
}

impl SalesforceConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// HubSpot Marketplace (pagination-based discovery)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubspotConfig {
    /// First listing page; later pages append `page-param=n`
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Query parameter carrying the page number
    #[serde(rename = "page-param")]
    pub page_param: String,

    /// Expected listings per page (0 = unknown)
    #[serde(rename = "page-size")]
    pub page_size: usize,

    /// Hard stop for paging
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Pacing floor between requests (milliseconds)
    #[serde(rename = "pacing-ms")]
    pub pacing_ms: u64,
}

impl Default for HubspotConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://ecosystem.hubspot.com/marketplace/explore?eco_PRODUCT_TYPE=APP"
                .to_string(),
            page_param: "eco_page".to_string(),
            page_size: 0,
            max_pages: 35,
            pacing_ms: 1000,
        }
    }
}

impl HubspotConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}
