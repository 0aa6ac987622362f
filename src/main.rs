//! Chainwalk main entry point
//!
//! This is the command-line interface for the Chainwalk page-chain archiver.

use anyhow::{anyhow, Context};
use chainwalk::config::{load_config, Config, SiteConfig};
use chainwalk::crawler::{Coordinator, Termination};
use chainwalk::state::{checkpoint_path, load_checkpoint};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Chainwalk: a resumable page-chain archiver
///
/// Chainwalk follows a comic's "next" links from page to page, saving each
/// page's image. Progress is checkpointed after every page; rerunning after
/// an interruption continues where the previous run stopped.
#[derive(Parser, Debug)]
#[command(name = "chainwalk")]
#[command(version)]
#[command(about = "A resumable page-chain archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Site to archive (required when the config lists several)
    #[arg(short, long)]
    site: Option<String>,

    /// Stop after this many pages (overrides the site's max-pages)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_pages: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be downloaded without downloading
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show the site's checkpoint and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let site = config.select_site(cli.site.as_deref()).ok_or_else(|| {
        let names: Vec<&str> = config.sites.iter().map(|s| s.name.as_str()).collect();
        match &cli.site {
            Some(name) => anyhow!("no site named '{}' (known: {})", name, names.join(", ")),
            None => anyhow!("config lists several sites, pick one with --site ({})", names.join(", ")),
        }
    })?;

    if cli.dry_run {
        handle_dry_run(&config, site)
    } else if cli.status {
        handle_status(site)
    } else {
        handle_walk(&config, site, cli.max_pages).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("chainwalk=info,warn"),
            1 => EnvFilter::new("chainwalk=debug,info"),
            2 => EnvFilter::new("chainwalk=trace,debug"),
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

/// Handles --dry-run: shows the resolved site and where the next run starts
fn handle_dry_run(config: &Config, site: &SiteConfig) -> anyhow::Result<()> {
    println!("=== Chainwalk Dry Run ===\n");

    println!("Site: {}", site.name);
    println!("  Initial URL: {}", site.initial_url);
    println!("  Output directory: {}", site.output_dir.display());
    match (&site.preset, &site.next_selector, &site.image_selector) {
        (Some(preset), _, _) => println!("  Layout: {}", preset),
        (None, Some(next), Some(image)) => {
            println!("  Next selector: {}", next);
            println!("  Image selector: {}", image);
        }
        _ => {}
    }
    if let Some(max) = site.max_pages {
        println!("  Max pages per run: {}", max);
    }

    println!("\nFetcher:");
    println!("  User agent: {}", config.user_agent.header_value());
    println!("  Page timeout: {}s", config.fetcher.timeout_secs);
    println!("  Asset timeout: {}s", config.fetcher.asset_timeout_secs);
    println!("  Connect timeout: {}s", config.fetcher.connect_timeout_secs);
    println!("  Delay between pages: {}ms", config.fetcher.request_delay_ms);

    println!();
    match load_checkpoint(&site.output_dir)? {
        Some(checkpoint) => match &checkpoint.last_page_url {
            Some(url) => println!(
                "✓ Would resume after page {} (re-reading {})",
                checkpoint.last_page_index, url
            ),
            None => println!(
                "✓ Would start at {} as page {}",
                site.initial_url,
                checkpoint.next_index()
            ),
        },
        None => println!("✓ Would start fresh at {}", site.initial_url),
    }

    Ok(())
}

/// Handles --status: prints the checkpoint of the selected site
fn handle_status(site: &SiteConfig) -> anyhow::Result<()> {
    let path = checkpoint_path(&site.output_dir);
    println!("Checkpoint: {}\n", path.display());

    match load_checkpoint(&site.output_dir)? {
        Some(checkpoint) => {
            println!("  Pages completed: {}", checkpoint.last_page_index);
            match checkpoint.last_page_url {
                Some(url) => println!("  Last page: {}", url),
                None => println!("  Last page: (none)"),
            }
        }
        None => println!("  No checkpoint yet"),
    }

    Ok(())
}

/// Handles the main walk
async fn handle_walk(
    config: &Config,
    site: &SiteConfig,
    max_pages: Option<u64>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Archiving '{}' into {}",
        site.name,
        site.output_dir.display()
    );

    let mut coordinator = Coordinator::from_config(config, site)?;
    if max_pages.is_some() {
        coordinator = coordinator.with_max_pages(max_pages);
    }

    match coordinator.run().await {
        Ok(summary) => {
            match summary.termination {
                Termination::EndOfChain => tracing::info!(
                    "Chain complete: {} new pages, {} in total",
                    summary.pages_processed,
                    summary.checkpoint.last_page_index
                ),
                Termination::PageLimit => tracing::info!(
                    "Stopped at page limit: {} new pages, {} in total",
                    summary.pages_processed,
                    summary.checkpoint.last_page_index
                ),
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Walk stopped: {}", e);
            if e.is_resumable() {
                tracing::info!("Run again to resume from the last checkpoint");
            }
            Err(e.into())
        }
    }
}
