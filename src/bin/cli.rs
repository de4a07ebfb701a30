//! Market Feeds CLI
//!
//! Serves RSS feeds for saved searches, or runs one-off searches and feed
//! builds from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use market_feeds::{
    config,
    error::{AppError, Result},
    models::{Config, SearchRequest},
    pipeline::{self, FeedOrchestrator},
    services::{self, MarketplaceApi, SignedClient},
    storage::{FeedStore, QueryRegistry},
};

/// Market Feeds - RSS for saved marketplace searches
#[derive(Parser, Debug)]
#[command(
    name = "market-feeds",
    version,
    about = "Saved marketplace searches as RSS feeds"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, alias = "debug")]
    verbose: bool,

    /// Saved queries file (overrides config)
    #[arg(long)]
    queries: Option<PathBuf>,

    /// Hours an item detail stays cached (overrides config)
    #[arg(long)]
    cache_ttl_hours: Option<u64>,

    /// Seconds between feed rebuild dispatches (overrides config)
    #[arg(long)]
    update_delay_secs: Option<u64>,

    /// Minutes between update cycles (overrides config)
    #[arg(long)]
    update_interval_mins: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep feeds updated and serve them over HTTP
    #[cfg(feature = "serve")]
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Run a single search and print the listings as JSON
    Search {
        #[arg(short, long)]
        keyword: String,

        /// Place name to search around
        #[arg(short, long)]
        location: String,

        /// Radius in kilometers
        #[arg(short, long, default_value_t = 5)]
        radius: u32,

        #[arg(long, default_value_t = 0)]
        min_price: u32,

        #[arg(long)]
        max_price: u32,

        /// Stop following pages older than this (overrides config)
        #[arg(long)]
        max_age_days: Option<u64>,
    },

    /// Build one saved query's feed and print it as RSS
    Feed { name: String },

    /// Validate configuration and saved queries
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Apply command line overrides on top of the loaded configuration.
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(queries) = &cli.queries {
        config.watch.queries_file = queries.clone();
    }
    if let Some(hours) = cli.cache_ttl_hours {
        config.feeds.cache_ttl_hours = hours;
    }
    if let Some(secs) = cli.update_delay_secs {
        config.feeds.update_delay_secs = secs;
    }
    if let Some(mins) = cli.update_interval_mins {
        config.feeds.update_interval_mins = mins;
    }
}

fn build_orchestrator(
    config: &Config,
    api: Arc<dyn MarketplaceApi>,
    registry: QueryRegistry,
) -> FeedOrchestrator {
    FeedOrchestrator::new(
        api,
        Arc::new(registry),
        Arc::new(FeedStore::new()),
        &config.api,
        config.feeds.clone(),
    )
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = config::load_config(&cli.config)?;
    apply_overrides(&cli, &mut config);
    config.validate()?;

    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        #[cfg(feature = "serve")]
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let registry = QueryRegistry::open(&config.watch.queries_file).await?;
            let api: Arc<dyn MarketplaceApi> = Arc::new(SignedClient::new(config.api.clone())?);
            let orchestrator = build_orchestrator(&config, api, registry);

            let summary = orchestrator.update_all().await;
            log::info!(
                "Initial update: {} feeds built, {} failed",
                summary.succeeded,
                summary.failed
            );

            tokio::spawn(pipeline::run_scheduler(
                orchestrator.clone(),
                config.feeds.update_interval(),
            ));

            let events =
                pipeline::watch_file(&config.watch.queries_file, config.watch.poll_interval())
                    .await?;
            tokio::spawn(pipeline::run_reloader(orchestrator.clone(), events));

            market_feeds::server::serve(&addr, Arc::clone(orchestrator.store())).await?;
        }

        Command::Search {
            keyword,
            location,
            radius,
            min_price,
            max_price,
            max_age_days,
        } => {
            let client = SignedClient::new(config.api.clone())?;
            let place = client.location(&location).await?;
            let request = SearchRequest {
                distance: u64::from(radius) * 1000,
                keywords: keyword,
                min_sale_price: min_price,
                max_sale_price: max_price,
                latitude: place.latitude,
                longitude: place.longitude,
                language: config.api.language.clone(),
            };
            let mut feeds = config.feeds.clone();
            if let Some(days) = max_age_days {
                feeds.max_age_days = days;
            }
            let max_age = feeds.max_age()?;

            let listings = services::search(&client, &request, max_age).await?;
            log::info!("Found {} listings", listings.len());
            println!("{}", serde_json::to_string_pretty(&listings)?);
        }

        Command::Feed { name } => {
            let registry = QueryRegistry::open(&config.watch.queries_file).await?;
            let api: Arc<dyn MarketplaceApi> = Arc::new(SignedClient::new(config.api.clone())?);
            let orchestrator = build_orchestrator(&config, api, registry);

            let feed = orchestrator.update_one(&name).await?;
            log::info!("Built feed '{}' with {} items", name, feed.items.len());
            println!("{}", feed.to_rss());
        }

        Command::Validate => {
            let registry = QueryRegistry::open(&config.watch.queries_file)
                .await
                .map_err(|e| {
                    log::error!(
                        "Invalid queries file {}: {}",
                        config.watch.queries_file.display(),
                        e
                    );
                    e
                })?;
            let queries = registry.current().await;
            if queries.is_empty() {
                return Err(AppError::validation("no saved queries defined"));
            }

            log::info!("Configuration is valid");
            log::info!("  - {} saved queries", queries.len());
            let mut names: Vec<_> = queries.keys().collect();
            names.sort();
            for name in names {
                log::info!("  - {}: {}", name, queries[name].keywords.join(", "));
            }
        }
    }

    Ok(())
}
