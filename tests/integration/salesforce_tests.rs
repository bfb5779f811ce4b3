//! Salesforce AppExchange runs against a mock sitemap

use crate::common::*;
use listing_harvester::{run_marketplace, HarvestError, Marketplace, RunError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sitemap_dedup_then_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let child_1 = format!("{}/sitemap-1.xml", base_url);
    let child_2 = format!("{}/sitemap-2.xml", base_url);
    mount_xml(&mock_server, "/sitemap.xml", sitemap_index(&[child_1, child_2])).await;

    // Child sitemaps list [A, B] and [B, C] plus a non-listing page
    mount_xml(
        &mock_server,
        "/sitemap-1.xml",
        url_set(&[
            salesforce_listing_url(&base_url, "A"),
            salesforce_listing_url(&base_url, "B"),
        ]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/sitemap-2.xml",
        url_set(&[
            salesforce_listing_url(&base_url, "B"),
            format!("{}/about", base_url),
            salesforce_listing_url(&base_url, "C"),
        ]),
    )
    .await;

    for id in ["A", "B", "C"] {
        mount_salesforce_detail(&mock_server, id).await;
    }

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, temp_dir.path());
    config.crawler.scrape_limit = 2;
    config.webhook.url = Some(format!("{}/hook", base_url));

    let report = run_marketplace(&config, Marketplace::SalesforceAppexchange)
        .await
        .expect("Run should succeed");

    assert_eq!(report.stats.discovered, 3);
    assert_eq!(report.stats.fetched, 2);
    assert_eq!(report.stats.normalized, 2);
    assert_eq!(report.stats.skipped, 0);
    assert_eq!(report.stats.webhook_sent, 2);
    assert_eq!(report.stats.webhook_failed, 0);

    // Exactly [A, B] were fetched
    assert_eq!(request_count(&mock_server, "/appxListingDetail").await, 2);

    let file_name = report
        .output_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(file_name.starts_with("salesforce_appexchange_"));
    assert_eq!(file_name.len(), "salesforce_appexchange_".len() + 14 + ".json".len());

    let records = read_records(&report.output_path);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["app_url"], salesforce_listing_url(&base_url, "A"));
    assert_eq!(records[1]["app_url"], salesforce_listing_url(&base_url, "B"));

    let first = &records[0];
    assert_eq!(first["app_name"], "App A");
    assert_eq!(first["vendor_name"], "Vendor A");
    assert_eq!(first["vendor_domain"], "vendor-a.com");
    assert_eq!(first["vendor_email"], "sales@example.com");
    assert_eq!(first["vendor_location"], "San Francisco, CA");
    assert_eq!(first["categories"], serde_json::json!(["Sales"]));
    assert_eq!(first["rating"], 4.5);
    assert_eq!(first["review_count"], 12);
    assert_eq!(first["marketplace"], "salesforce_appexchange");
    assert!(first["scraped_at"].as_str().unwrap().ends_with("+00:00"));
}

#[tokio::test]
async fn test_root_sitemap_failure_is_fatal() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), temp_dir.path());
    let err = run_marketplace(&config, Marketplace::SalesforceAppexchange)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Run(RunError::DiscoveryFailed {
            marketplace: Marketplace::SalesforceAppexchange,
            ..
        })
    ));
    assert!(output_files(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_unparsable_root_sitemap_is_fatal() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_xml(&mock_server, "/sitemap.xml", "not a sitemap".to_string()).await;

    let config = create_test_config(&mock_server.uri(), temp_dir.path());
    let result = run_marketplace(&config, Marketplace::SalesforceAppexchange).await;

    assert!(matches!(result, Err(HarvestError::Run(_))));
    assert!(output_files(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_child_sitemap_failure_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    mount_xml(
        &mock_server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{}/sitemap-broken.xml", base_url),
            format!("{}/sitemap-ok.xml", base_url),
        ]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-broken.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    mount_xml(
        &mock_server,
        "/sitemap-ok.xml",
        url_set(&[salesforce_listing_url(&base_url, "A")]),
    )
    .await;
    mount_salesforce_detail(&mock_server, "A").await;

    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_marketplace(&config, Marketplace::SalesforceAppexchange)
        .await
        .expect("Child failure must not abort the run");

    assert_eq!(report.stats.discovered, 1);
    assert_eq!(report.stats.normalized, 1);
    assert_eq!(read_records(&report.output_path).len(), 1);
}

#[tokio::test]
async fn test_detail_failures_are_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    // B has no detail mock (404); C returns a page without a listing payload
    mount_xml(
        &mock_server,
        "/sitemap.xml",
        url_set(&[
            salesforce_listing_url(&base_url, "A"),
            salesforce_listing_url(&base_url, "B"),
            salesforce_listing_url(&base_url, "C"),
        ]),
    )
    .await;
    mount_salesforce_detail(&mock_server, "A").await;

    Mock::given(method("GET"))
        .and(path("/appxListingDetail"))
        .and(wiremock::matchers::query_param("listingId", "C"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html><body>Moved</body></html>", "text/html"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_marketplace(&config, Marketplace::SalesforceAppexchange)
        .await
        .expect("Detail failures must not abort the run");

    assert_eq!(report.stats.discovered, 3);
    assert_eq!(report.stats.fetched, 1);
    assert_eq!(report.stats.normalized, 1);
    assert_eq!(report.stats.skipped, 2);

    let records = read_records(&report.output_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["app_name"], "App A");
}

#[tokio::test]
async fn test_nested_sitemap_indexes_are_walked_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let root = format!("{}/sitemap.xml", base_url);
    let nested = format!("{}/sitemap-nested.xml", base_url);
    let leaf = format!("{}/sitemap-leaf.xml", base_url);
    let deep = format!("{}/sitemap-deep.xml", base_url);

    mount_xml(
        &mock_server,
        "/sitemap.xml",
        sitemap_index(&[nested.clone(), leaf.clone()]),
    )
    .await;
    // Points back at the root and repeats the leaf
    mount_xml(
        &mock_server,
        "/sitemap-nested.xml",
        sitemap_index(&[root, leaf, deep]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/sitemap-leaf.xml",
        url_set(&[salesforce_listing_url(&base_url, "A")]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/sitemap-deep.xml",
        url_set(&[salesforce_listing_url(&base_url, "B")]),
    )
    .await;
    mount_salesforce_detail(&mock_server, "A").await;
    mount_salesforce_detail(&mock_server, "B").await;

    let config = create_test_config(&base_url, temp_dir.path());
    let report = run_marketplace(&config, Marketplace::SalesforceAppexchange)
        .await
        .expect("Run should succeed");

    assert_eq!(request_count(&mock_server, "/sitemap.xml").await, 1);
    assert_eq!(request_count(&mock_server, "/sitemap-nested.xml").await, 1);
    assert_eq!(request_count(&mock_server, "/sitemap-leaf.xml").await, 1);
    assert_eq!(request_count(&mock_server, "/sitemap-deep.xml").await, 1);
    assert_eq!(report.stats.discovered, 2);

    let records = read_records(&report.output_path);
    let names: Vec<&str> = records
        .iter()
        .map(|r| r["app_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["App A", "App B"]);
}
