//! Feed-Harvester main entry point
//!
//! This is the command-line interface for the Feed-Harvester post crawler.

use anyhow::{Context, Result};
use clap::Parser;
use feed_harvester::catalog::FEED_QUERY;
use feed_harvester::config::{load_config_with_hash, Config};
use feed_harvester::engine::{refresh_reactions, required_queries, HarvestSettings};
use feed_harvester::media::MediaStore;
use feed_harvester::output::{print_plan, print_report};
use feed_harvester::{FeedRequest, Harvester, HttpTransport, JsonlSink, QueryCatalog, ReactionTable};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Feed-Harvester: a tolerant feed, comment and reply crawler
///
/// Feed-Harvester walks a paginated feed of posts, collects each post's root
/// comments and their direct replies, and appends every completed post to a
/// JSON Lines file.
#[derive(Parser, Debug)]
#[command(name = "feed-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A tolerant feed, comment and reply crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and catalogs and show what would be harvested
    #[arg(long, conflicts_with = "refresh_reactions")]
    dry_run: bool,

    /// Collect posts only, without comments
    #[arg(long)]
    no_comments: bool,

    /// Override the configured maximum number of posts
    #[arg(long, value_name = "N")]
    max_posts: Option<usize>,

    /// Rebuild the reaction identifier table from a live feed response and exit
    #[arg(long, conflicts_with = "dry_run")]
    refresh_reactions: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.no_comments {
        config.crawler.include_comments = false;
    }
    if let Some(max_posts) = cli.max_posts {
        anyhow::ensure!(max_posts > 0, "--max-posts must be at least 1");
        config.crawler.max_posts = max_posts;
    }

    if cli.refresh_reactions {
        handle_refresh_reactions(&config).await
    } else if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_harvest(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feed_harvester=info,warn"),
            1 => EnvFilter::new("feed_harvester=debug,info"),
            2 => EnvFilter::new("feed_harvester=trace,debug"),
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

fn load_catalog(config: &Config) -> Result<QueryCatalog> {
    let path = Path::new(&config.catalog.queries_path);
    let catalog = QueryCatalog::load(path)
        .with_context(|| format!("failed to load query catalog {}", path.display()))?;
    tracing::info!("Loaded {} query identifiers", catalog.len());
    Ok(catalog)
}

fn load_reactions(config: &Config) -> Result<ReactionTable> {
    let path = Path::new(&config.catalog.reactions_path);
    let table = ReactionTable::load(path)
        .with_context(|| format!("failed to load reaction table {}", path.display()))?;
    if table.is_empty() {
        tracing::warn!("Reaction table is empty; comment reaction details will be dropped");
    }
    Ok(table)
}

/// Handles the --dry-run mode: validates everything a harvest needs
fn handle_dry_run(config: &Config) -> Result<()> {
    let request = FeedRequest::from_config(config)?;
    let catalog = load_catalog(config)?;
    let reactions = load_reactions(config)?;

    catalog
        .lookup(FEED_QUERY)
        .context("the query catalog cannot serve this harvest")?;
    let missing: Vec<_> = required_queries(request.include_comments)
        .iter()
        .filter(|name| !catalog.contains(name))
        .collect();

    print_plan(config, &request, catalog.len(), reactions.len());
    for name in missing {
        println!("⚠ Query {} is missing; the streams that need it will be skipped", name);
    }
    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --refresh-reactions mode
async fn handle_refresh_reactions(config: &Config) -> Result<()> {
    let request = FeedRequest::from_config(config)?;
    let catalog = load_catalog(config)?;
    let transport = HttpTransport::new(&config.transport)?;
    let settings = HarvestSettings::from(&config.crawler);

    let path = Path::new(&config.catalog.reactions_path);
    match refresh_reactions(&transport, &catalog, &request, &settings).await? {
        Some(table) => {
            table.save(path)?;
            println!("✓ Saved {} reaction names to {}", table.len(), path.display());
            Ok(())
        }
        None => anyhow::bail!("no reaction identifier table found in the feed response"),
    }
}

/// Handles the main harvest
async fn handle_harvest(config: &Config) -> Result<()> {
    let request = FeedRequest::from_config(config)?;
    let catalog = load_catalog(config)?;
    let reactions = load_reactions(config)?;
    let transport = HttpTransport::new(&config.transport)?;

    let media = if config.output.download_media {
        MediaStore::new(transport.client().clone(), &config.output.media_directory)
    } else {
        MediaStore::disabled()
    };
    let sink = JsonlSink::new(config.output.deduplicate);

    let mut harvester = Harvester::new(
        transport,
        catalog,
        reactions,
        media,
        sink,
        HarvestSettings::from(&config.crawler),
    );

    match harvester.crawl_feed(&request).await {
        Ok(report) => {
            tracing::info!("Harvest completed");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
