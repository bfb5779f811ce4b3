use crate::config::types::{
    Config, CrawlerConfig, HubspotConfig, OutputConfig, SalesforceConfig, UserAgentConfig,
    WebhookConfig,
};
use crate::ConfigError;
use url::Url;

/// Lowest pacing floor accepted for any target (milliseconds)
const MIN_PACING_MS: u64 = 100;

/// Largest webhook batch accepted
const MAX_BATCH_SIZE: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_webhook_config(&config.webhook)?;
    validate_salesforce_config(&config.salesforce)?;
    validate_hubspot_config(&config.hubspot)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // scrape_limit: every usize is meaningful (0 = unlimited)

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.progress_interval == 0 {
        return Err(ConfigError::Validation(
            "progress_interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates webhook configuration
fn validate_webhook_config(config: &WebhookConfig) -> Result<(), ConfigError> {
    if let Some(url) = &config.url {
        validate_http_url("webhook url", url)?;
    }

    if config.batch_size < 1 || config.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.batch_size
        )));
    }

    validate_pacing("webhook batch_delay_ms", config.batch_delay_ms)
}

fn validate_salesforce_config(config: &SalesforceConfig) -> Result<(), ConfigError> {
    validate_http_url("salesforce sitemap_url", &config.sitemap_url)?;
    validate_pacing("salesforce pacing_ms", config.pacing_ms)
}

fn validate_hubspot_config(config: &HubspotConfig) -> Result<(), ConfigError> {
    validate_http_url("hubspot listing_url", &config.listing_url)?;

    if config.page_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "hubspot page_param cannot be empty".to_string(),
        ));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "hubspot max_pages must be >= 1".to_string(),
        ));
    }

    validate_pacing("hubspot pacing_ms", config.pacing_ms)
}

fn validate_pacing(name: &str, value_ms: u64) -> Result<(), ConfigError> {
    if value_ms < MIN_PACING_MS {
        return Err(ConfigError::Validation(format!(
            "{} must be >= {}ms, got {}ms",
            name, MIN_PACING_MS, value_ms
        )));
    }
    Ok(())
}

/// Checks that `value` parses as an absolute http(s) URL
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
