//! HubSpot Marketplace runs against mock listing pages

use crate::common::*;
use listing_harvester::{run_marketplace, HarvestError, Marketplace, RunError};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_page(slugs: &[&str], has_next: bool) -> String {
    let next = if has_next {
        r#"<link rel="next" href="/marketplace/explore">"#
    } else {
        ""
    };
    let cards: String = slugs
        .iter()
        .map(|slug| format!(r#"<a href="/marketplace/listing/{0}">{0}</a>"#, slug))
        .collect();
    format!(
        "<html><head>{}</head><body><div class=\"results\">{}</div></body></html>",
        next, cards
    )
}

fn detail_page(slug: &str) -> String {
    format!(
        r#"<html><head><title>{0} | HubSpot App Marketplace</title>
        <meta name="description" content="The {0} integration."></head>
        <body><h1>{0}</h1><div class="vendor-name">{0} Labs</div>
        <p>contact: support@{0}.io</p></body></html>"#,
        slug
    )
}

async fn mount_page(server: &MockServer, page: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/marketplace/explore"))
        .and(query_param("eco_page", page.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer, slugs: &[&str]) {
    for slug in slugs {
        Mock::given(method("GET"))
            .and(path(format!("/marketplace/listing/{}", slug)))
            .respond_with(ResponseTemplate::new(200).set_body_raw(detail_page(slug), "text/html"))
            .mount(server)
            .await;
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

#[tokio::test]
async fn test_paging_until_no_new_listings() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, 1, html(listing_page(&["alpha", "beta"], true))).await;
    mount_page(&mock_server, 2, html(listing_page(&["beta", "gamma"], false))).await;
    // Nothing new on page 3, so page 4 is never requested
    mount_page(&mock_server, 3, html(listing_page(&["gamma"], false))).await;
    mount_details(&mock_server, &["alpha", "beta", "gamma"]).await;

    let config = create_test_config(&mock_server.uri(), temp_dir.path());
    let report = run_marketplace(&config, Marketplace::HubspotMarketplace)
        .await
        .expect("Run should succeed");

    assert_eq!(request_count(&mock_server, "/marketplace/explore").await, 3);
    assert_eq!(report.stats.discovered, 3);
    assert_eq!(report.stats.normalized, 3);

    let records = read_records(&report.output_path);
    let names: Vec<&str> = records
        .iter()
        .map(|r| r["app_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);

    for record in &records {
        assert_eq!(record["marketplace"], "hubspot_marketplace");
        // Present in the schema, always null for HubSpot
        assert!(record.as_object().unwrap().contains_key("vendor_email"));
        assert!(record["vendor_email"].is_null());
        assert!(record["vendor_location"].is_null());
        assert!(record["scraped_at"].is_string());
    }
    assert_eq!(records[0]["vendor_name"], "alpha Labs");
    assert_eq!(records[0]["description"], "The alpha integration.");
}

#[tokio::test]
async fn test_empty_page_stops_paging() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, 1, html(listing_page(&["alpha"], true))).await;
    mount_page(&mock_server, 2, html(listing_page(&[], true))).await;
    mount_details(&mock_server, &["alpha"]).await;

    let config = create_test_config(&mock_server.uri(), temp_dir.path());
    let report = run_marketplace(&config, Marketplace::HubspotMarketplace)
        .await
        .expect("Run should succeed");

    assert_eq!(request_count(&mock_server, "/marketplace/explore").await, 2);
    assert_eq!(report.stats.normalized, 1);
}

#[tokio::test]
async fn test_first_page_failure_is_fatal() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, 1, ResponseTemplate::new(503)).await;

    let config = create_test_config(&mock_server.uri(), temp_dir.path());
    let err = run_marketplace(&config, Marketplace::HubspotMarketplace)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Run(RunError::DiscoveryFailed {
            marketplace: Marketplace::HubspotMarketplace,
            ..
        })
    ));
    assert!(output_files(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_later_page_failure_keeps_discovered_listings() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, 1, html(listing_page(&["alpha", "beta"], true))).await;
    mount_page(&mock_server, 2, ResponseTemplate::new(500)).await;
    mount_page(&mock_server, 3, html(listing_page(&["gamma"], false))).await;
    mount_details(&mock_server, &["alpha", "beta", "gamma"]).await;

    let config = create_test_config(&mock_server.uri(), temp_dir.path());
    let report = run_marketplace(&config, Marketplace::HubspotMarketplace)
        .await
        .expect("A later page failure must not abort the run");

    assert_eq!(request_count(&mock_server, "/marketplace/explore").await, 2);
    assert_eq!(report.stats.discovered, 2);

    let records = read_records(&report.output_path);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["app_name"], "beta");
}

#[tokio::test]
async fn test_scrape_limit_stops_paging_early() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, 1, html(listing_page(&["alpha", "beta"], true))).await;
    mount_page(&mock_server, 2, html(listing_page(&["gamma"], true))).await;
    mount_details(&mock_server, &["alpha", "beta", "gamma"]).await;

    let mut config = create_test_config(&mock_server.uri(), temp_dir.path());
    config.crawler.scrape_limit = 1;

    let report = run_marketplace(&config, Marketplace::HubspotMarketplace)
        .await
        .expect("Run should succeed");

    assert_eq!(request_count(&mock_server, "/marketplace/explore").await, 1);
    assert_eq!(request_count(&mock_server, "/marketplace/listing/alpha").await, 1);
    assert_eq!(request_count(&mock_server, "/marketplace/listing/beta").await, 0);
    assert_eq!(report.stats.normalized, 1);
}

#[tokio::test]
async fn test_short_page_stops_paging_with_known_page_size() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    // No next markers, so page fullness alone decides
    mount_page(&mock_server, 1, html(listing_page(&["alpha", "beta"], false))).await;
    mount_page(&mock_server, 2, html(listing_page(&["gamma"], false))).await;
    mount_page(&mock_server, 3, html(listing_page(&["delta", "epsilon"], false))).await;
    mount_details(&mock_server, &["alpha", "beta", "gamma", "delta", "epsilon"]).await;

    let mut config = create_test_config(&mock_server.uri(), temp_dir.path());
    config.hubspot.page_size = 2;

    let report = run_marketplace(&config, Marketplace::HubspotMarketplace)
        .await
        .expect("Run should succeed");

    assert_eq!(request_count(&mock_server, "/marketplace/explore").await, 2);
    assert_eq!(report.stats.discovered, 3);

    let records = read_records(&report.output_path);
    assert_eq!(records.len(), 3);
    assert_eq!(records[2]["app_name"], "gamma");
}
