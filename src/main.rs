//! Site-Mirror main entry point
//!
//! This is the command-line interface for the Site-Mirror crawl engine.

use clap::Parser;
use site_mirror::config::{config_fingerprint, load_config, validate, Config};
use site_mirror::crawler::Coordinator;
use site_mirror::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Mirror: a static website mirroring engine
///
/// Site-Mirror crawls a website from a start URL, downloads every page and
/// asset below the crawl origin exactly once, lays them out on disk following
/// the URL path hierarchy, and writes a sitemap.json manifest.
#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Mirror a website to disk", long_about = None)]
struct Cli {
    /// Start URL (https:// is assumed when no scheme is given)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Delay between requests of one worker, in seconds
    #[arg(short, long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Number of concurrent workers
    #[arg(short, long, value_name = "N")]
    concurrency: Option<u32>,

    /// Per-request timeout, in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Accept invalid certificates and legacy TLS versions (unsafe)
    #[arg(long)]
    legacy_tls: bool,

    /// Stop the crawl after this many seconds
    #[arg(long, value_name = "SECONDS")]
    max_duration: Option<u64>,

    /// Re-download assets that already exist in the output directory
    #[arg(long)]
    no_skip_existing: bool,

    /// Save pages exactly as served, without pointing links into the mirror
    #[arg(long)]
    no_rewrite: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        validate(&config)?;
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mirror=info,warn"),
            1 => EnvFilter::new("site_mirror=debug,info"),
            2 => EnvFilter::new("site_mirror=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.crawler.start_url = url.clone();
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
    if let Some(delay) = cli.delay {
        if !delay.is_finite() || delay < 0.0 {
            return Err(format!("--delay must be a non-negative number, got {}", delay).into());
        }
        config.crawler.delay_ms = (delay * 1000.0).round() as u64;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    if let Some(max_duration) = cli.max_duration {
        config.crawler.max_duration_secs = Some(max_duration);
    }
    if cli.legacy_tls {
        config.http.tls_compat = true;
    }
    if cli.no_skip_existing {
        config.crawler.skip_existing_assets = false;
    }
    if cli.no_rewrite {
        config.output.rewrite_links = false;
    }

    Ok(config)
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Mirror Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!(
        "  Origin: {}",
        config
            .crawler
            .origin
            .as_deref()
            .unwrap_or("(same as start URL)")
    );
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Delay: {}ms", config.crawler.delay_ms);
    match config.crawler.max_duration_secs {
        Some(secs) => println!("  Max duration: {}s", secs),
        None => println!("  Max duration: unlimited"),
    }
    println!(
        "  Skip existing assets: {}",
        config.crawler.skip_existing_assets
    );

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  TLS compatibility mode: {}", config.http.tls_compat);
    println!("  User agent: {}", config.http.user_agent);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Sitemap: {}", config.output.sitemap_file);
    println!("  Rewrite links: {}", config.output.rewrite_links);

    if let Ok(hash) = config_fingerprint(config) {
        println!("\nFingerprint: {}", hash);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    match config_fingerprint(&config) {
        Ok(hash) => tracing::info!("Configuration fingerprint: {}", hash),
        Err(e) => tracing::debug!("Could not fingerprint configuration: {}", e),
    }

    let coordinator = match Coordinator::new(config) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            tracing::error!("Failed to start crawl: {}", e);
            return Err(e.into());
        }
    };

    let handle = coordinator.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    match coordinator.run().await {
        Ok(stats) => {
            tracing::info!("Crawl completed successfully");
            if !quiet {
                println!();
                print_statistics(&stats);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
