use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use std::path::Path;

/// Values supplied by the environment or the command line
///
/// Each `Some` field replaces the corresponding value from the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `SCRAPE_LIMIT`
    pub scrape_limit: Option<usize>,

    /// `CLAY_WEBHOOK_URL`
    pub webhook_url: Option<String>,

    /// Output directory for the local sink
    pub output_dir: Option<String>,
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use listing_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvester.toml")).unwrap();
/// println!("Scrape limit: {}", config.crawler.scrape_limit);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let config = parse_file(path)?;
    validate(&config)?;
    Ok(config)
}

/// Builds the effective configuration for a run
///
/// Starts from the file at `path` (or the built-in defaults when `None`),
/// applies the overrides, then validates the result.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> ConfigResult<Config> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => Config::default(),
    };

    apply_overrides(&mut config, overrides);
    validate(&config)?;

    Ok(config)
}

/// Reads and deserializes a TOML file without validating it
fn parse_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Applies environment/CLI overrides on top of a loaded configuration
pub fn apply_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(limit) = overrides.scrape_limit {
        config.crawler.scrape_limit = limit;
    }

    // An empty value disables delivery
    if let Some(url) = &overrides.webhook_url {
        let url = url.trim();
        config.webhook.url = if url.is_empty() {
            None
        } else {
            Some(url.to_string())
        };
    }

    if let Some(dir) = &overrides.output_dir {
        config.output.directory = dir.clone();
    }
}
