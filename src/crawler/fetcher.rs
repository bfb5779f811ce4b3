//! HTTP fetcher implementation
//!
//! This module handles all outbound GET requests for the crawlers, including:
//! - Building HTTP clients with proper user agent strings
//! - Enforcing a per-crawler pacing floor before each request
//! - Content-Type checks against the expected document kind
//! - Error classification (timeout, HTTP status, transport)
//!
//! The fetcher never retries. Whether a failure is fatal or skip-worthy is the
//! caller's decision.

use crate::config::UserAgentConfig;
use crate::crawler::pacing::PacingFloor;
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// The kind of document a caller expects back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedContent {
    /// An HTML page (listing page or detail page)
    Html,

    /// A sitemap document; anything but an HTML page is accepted
    Xml,
}

impl ExpectedContent {
    /// Checks a Content-Type header value against the expectation
    ///
    /// An empty header is always accepted.
    pub fn accepts(&self, content_type: &str) -> bool {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.trim().is_empty() {
            return true;
        }

        match self {
            Self::Html => content_type.contains("html"),
            Self::Xml => !content_type.contains("text/html"),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total timeout applied to every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use listing_harvester::config::UserAgentConfig;
/// use listing_harvester::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited GET client owned by a single crawler
///
/// Each crawler owns its own fetcher, so the pacing floor is scoped to that
/// crawler's target.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    pacing: PacingFloor,
    requests_made: u64,
}

impl HttpFetcher {
    /// Creates a fetcher with the given pacing floor
    pub fn new(client: Client, pacing_floor: Duration) -> Self {
        let pacing = PacingFloor::new(pacing_floor);
        tracing::debug!("Fetcher pacing floor: {:?}", pacing.floor());

        Self {
            client,
            pacing,
            requests_made: 0,
        }
    }

    /// Number of requests issued so far
    pub fn requests_made(&self) -> u64 {
        self.requests_made
    }

    /// Fetches a URL and returns its body
    ///
    /// # Request Flow
    ///
    /// 1. Wait out the pacing floor since the previous request finished
    /// 2. Send GET request (client timeout applies)
    /// 3. Non-2xx → `HttpStatus`
    /// 4. Content-Type incompatible with `expected` → `ContentMismatch`
    /// 5. Read body
    ///
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Timeout (send or body) | `Timeout` |
    /// | Non-2xx status | `HttpStatus { code }` |
    /// | DNS / connect / reset | `Transport` |
    /// | Wrong document kind | `ContentMismatch` |
    pub async fn fetch(&mut self, url: &str, expected: ExpectedContent) -> Result<String, FetchError> {
        self.pacing.wait().await;

        let result = self.fetch_once(url, expected).await;

        self.requests_made += 1;
        self.pacing.mark_finished();

        match &result {
            Ok(body) => tracing::debug!("Fetched {} ({} bytes)", url, body.len()),
            Err(e) => tracing::debug!("Fetch failed: {}", e),
        }

        result
    }

    async fn fetch_once(&self, url: &str, expected: ExpectedContent) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        // Check Content-Type
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !expected.accepts(&content_type) {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
