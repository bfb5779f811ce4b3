//! Listing-Harvester main entry point
//!
//! This is the command-line interface for harvesting one marketplace per run.

use clap::{Parser, ValueEnum};
use listing_harvester::config::{resolve_config, Config, ConfigOverrides};
use listing_harvester::output::{output_file_name, print_statistics};
use listing_harvester::{run_marketplace, HarvestError, Marketplace};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Listing-Harvester: a polite marketplace listing harvester
///
/// Discovers app listings on one marketplace, normalizes them into a common
/// record schema, writes them to a local JSON file and optionally forwards
/// them to a webhook in batches.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version)]
#[command(about = "A polite marketplace listing harvester", long_about = None)]
struct Cli {
    /// Marketplace to harvest
    #[arg(value_enum, value_name = "MARKETPLACE")]
    marketplace: MarketplaceArg,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum listings to fetch (0 = unlimited)
    #[arg(long, env = "SCRAPE_LIMIT", value_name = "N")]
    scrape_limit: Option<usize>,

    /// Webhook receiving record batches (delivery disabled when absent)
    #[arg(long, env = "CLAY_WEBHOOK_URL", value_name = "URL", hide_env_values = true)]
    webhook_url: Option<String>,

    /// Directory for the local JSON output
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without harvesting
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MarketplaceArg {
    /// Salesforce AppExchange (sitemap discovery)
    Salesforce,

    /// HubSpot Marketplace (paginated discovery)
    Hubspot,
}

impl From<MarketplaceArg> for Marketplace {
    fn from(arg: MarketplaceArg) -> Self {
        match arg {
            MarketplaceArg::Salesforce => Marketplace::SalesforceAppexchange,
            MarketplaceArg::Hubspot => Marketplace::HubspotMarketplace,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let overrides = ConfigOverrides {
        scrape_limit: cli.scrape_limit,
        webhook_url: cli.webhook_url.clone(),
        output_dir: cli.output_dir.clone(),
    };

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    let config = match resolve_config(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let marketplace = Marketplace::from(cli.marketplace);

    if cli.dry_run {
        handle_dry_run(&config, marketplace);
        return ExitCode::SUCCESS;
    }

    match handle_harvest(&config, marketplace, cli.quiet).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, marketplace: Marketplace) {
    println!("=== Listing-Harvester Dry Run ===\n");

    println!("Marketplace: {}", marketplace);

    println!("\nCrawler:");
    match config.crawler.scrape_limit {
        0 => println!("  Scrape limit: unlimited"),
        n => println!("  Scrape limit: {}", n),
    }
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Progress interval: {}", config.crawler.progress_interval);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nDiscovery:");
    match marketplace {
        Marketplace::SalesforceAppexchange => {
            println!("  Sitemap: {}", config.salesforce.sitemap_url);
            println!("  Listing pattern: {}", config.salesforce.listing_url_pattern);
            println!("  Pacing: {}ms", config.salesforce.pacing_ms);
        }
        Marketplace::HubspotMarketplace => {
            println!("  Listing URL: {}", config.hubspot.listing_url);
            println!("  Page parameter: {}", config.hubspot.page_param);
            println!("  Max pages: {}", config.hubspot.max_pages);
            println!("  Pacing: {}ms", config.hubspot.pacing_ms);
        }
    }

    println!("\nOutput:");
    println!(
        "  Local file: {}/{}",
        config.output.directory,
        output_file_name(marketplace, chrono::Utc::now())
    );
    match &config.webhook.url {
        Some(_) => println!(
            "  Webhook: enabled (batches of {}, {}ms apart)",
            config.webhook.batch_size, config.webhook.batch_delay_ms
        ),
        None => println!("  Webhook: disabled"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: &Config,
    marketplace: Marketplace,
    quiet: bool,
) -> Result<(), HarvestError> {
    tracing::info!("Starting {} harvest", marketplace);

    let report = run_marketplace(config, marketplace).await?;

    tracing::info!("Results written to {}", report.output_path.display());

    if !quiet {
        println!();
        print_statistics(marketplace.as_str(), &report.stats);
    }

    Ok(())
}
