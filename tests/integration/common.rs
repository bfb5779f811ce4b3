//! Shared fixtures for the integration tests

use listing_harvester::config::{
    Config, CrawlerConfig, HubspotConfig, OutputConfig, SalesforceConfig, UserAgentConfig,
    WebhookConfig,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing both marketplaces at the mock server
pub fn create_test_config(server_uri: &str, output_dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            scrape_limit: 0,
            request_timeout_secs: 5,
            progress_interval: 1,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            directory: output_dir.to_string_lossy().into_owned(),
        },
        webhook: WebhookConfig {
            url: None,
            batch_size: 100,
            batch_delay_ms: 0,
        },
        salesforce: SalesforceConfig {
            sitemap_url: format!("{}/sitemap.xml", server_uri),
            listing_url_pattern: "appxListingDetail".to_string(),
            pacing_ms: 0,
        },
        hubspot: HubspotConfig {
            listing_url: format!("{}/marketplace/explore?eco_page=1", server_uri),
            page_param: "eco_page".to_string(),
            page_size: 0,
            max_pages: 10,
            pacing_ms: 0,
        },
    }
}

pub fn salesforce_listing_url(server_uri: &str, id: &str) -> String {
    format!("{}/appxListingDetail?listingId={}", server_uri, id)
}

pub fn sitemap_index(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|loc| format!("  <sitemap><loc>{}</loc></sitemap>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>",
        entries
    )
}

pub fn url_set(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|loc| format!("  <url><loc>{}</loc></url>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        entries
    )
}

pub async fn mount_xml(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/xml"))
        .mount(server)
        .await;
}

/// Mounts a Salesforce detail page for listing `id`
pub async fn mount_salesforce_detail(server: &MockServer, id: &str) {
    let stores = serde_json::json!({
        "LISTING": {
            "listing": {
                "name": format!("App {}", id),
                "description": "Does things.",
                "publisher": {
                    "name": format!("Vendor {}", id),
                    "website": format!("https://www.vendor-{}.com/about", id.to_lowercase()),
                    "email": "sales@example.com",
                    "hQLocation": "San Francisco, CA"
                },
                "extensions": [{"data": {"listingCategories": ["Sales"]}}],
                "reviewsSummary": {"averageRating": 4.5, "reviewCount": 12}
            }
        }
    });
    let html = format!(
        "<html><head><script>window.stores = {};</script></head><body></body></html>",
        stores
    );

    Mock::given(method("GET"))
        .and(path("/appxListingDetail"))
        .and(query_param("listingId", id))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

/// Mounts a root url set listing the given Salesforce ids plus their details
pub async fn mount_salesforce_marketplace(server: &MockServer, ids: &[&str]) {
    let urls: Vec<String> = ids
        .iter()
        .map(|id| salesforce_listing_url(&server.uri(), id))
        .collect();
    mount_xml(server, "/sitemap.xml", url_set(&urls)).await;

    for id in ids {
        mount_salesforce_detail(server, id).await;
    }
}

/// JSON files written to `dir`
pub fn output_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .expect("Failed to read output dir")
        .map(|entry| entry.expect("Failed to read dir entry").path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

/// Parses a local output file into raw JSON records
pub fn read_records(path: &Path) -> Vec<Value> {
    let contents = std::fs::read_to_string(path).expect("Failed to read output file");
    serde_json::from_str(&contents).expect("Output file is not a JSON array")
}

/// Number of requests the server received for `at`
pub async fn request_count(server: &MockServer, at: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == at)
        .count()
}
