//! Polite-Crawler main entry point
//!
//! This is the command-line interface for the Polite-Crawler web crawler.

use clap::Parser;
use polite_crawler::config::{compute_config_hash, hash_content, read_config, validate, Config};
use polite_crawler::crawler::{Coordinator, CrawlReport, ShutdownHandle};
use polite_crawler::output::{generate_markdown_summary, print_statistics, ResultSink, SqliteSink};
use polite_crawler::storage::{open_storage, Storage};
use polite_crawler::{ConfigError, CrawlError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Polite-Crawler: a bounded-concurrency, polite web crawler
///
/// Crawls from the given seeds up to a maximum depth with a fixed pool of
/// workers, honoring robots.txt and a minimum delay between requests to the
/// same host. A first Ctrl-C drains the crawl; a second one stops it at once.
#[derive(Parser, Debug)]
#[command(name = "polite-crawler")]
#[command(version)]
#[command(about = "A bounded-concurrency, polite web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed URL (repeatable); replaces the seeds from the config file
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Maximum link depth from the seeds
    #[arg(long)]
    max_depth: Option<u32>,

    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<u32>,

    /// Global crawl timeout in milliseconds (0 disables it)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    fetch_timeout_ms: Option<u64>,

    /// Minimum delay between requests to the same host in milliseconds
    #[arg(long)]
    min_delay_ms: Option<u64>,

    /// Grace period for in-flight fetches after a stop, in milliseconds
    #[arg(long)]
    grace_ms: Option<u64>,

    /// SQLite database receiving fetch outcomes
    #[arg(long, value_name = "DB")]
    output: Option<PathBuf>,

    /// Markdown summary written when the crawl ends
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the latest run in the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if !self.seeds.is_empty() {
            config.seeds = self.seeds.clone();
        }
        if let Some(depth) = self.max_depth {
            config.crawler.max_depth = depth;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(ms) = self.timeout_ms {
            config.crawler.global_timeout_ms = ms;
        }
        if let Some(ms) = self.fetch_timeout_ms {
            config.crawler.fetch_timeout_ms = ms;
        }
        if let Some(ms) = self.min_delay_ms {
            config.crawler.min_host_delay_ms = ms;
        }
        if let Some(ms) = self.grace_ms {
            config.crawler.grace_period_ms = ms;
        }
        if let Some(path) = &self.output {
            config.output.database_path = Some(path.display().to_string());
        }
        if let Some(path) = &self.summary {
            config.output.summary_path = Some(path.display().to_string());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match load_effective_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    let result = if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, &config_hash).await
    };

    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    ExitCode::from(exit_code(&result))
}

/// 2 for configuration errors, 1 for any other fatal error
fn exit_code(result: &Result<(), CrawlError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(CrawlError::Config(_)) => 2,
        Err(_) => 1,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence when it is set.
fn setup_logging(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "polite_crawler=info,warn",
            1 => "polite_crawler=debug,info",
            2 => "polite_crawler=trace,debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads the config file (if any), applies overrides and validates the result
///
/// The hash is taken from the file content, or from the effective settings
/// when no file was given.
fn load_effective_config(cli: &Cli) -> Result<(Config, String), ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate(&config)?;

    let hash = match &cli.config {
        Some(path) => compute_config_hash(path)?,
        None => hash_content(&format!("{:?}", config)),
    };
    tracing::debug!("Configuration hash: {}", hash);

    Ok((config, hash))
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Polite-Crawler Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Workers: {}", crawler.workers);
    match crawler.global_timeout() {
        Some(limit) => println!("  Global timeout: {}ms", limit.as_millis()),
        None => println!("  Global timeout: none"),
    }
    println!("  Fetch timeout: {}ms", crawler.fetch_timeout_ms);
    println!("  Minimum host delay: {}ms", crawler.min_host_delay_ms);
    println!("  Grace period: {}ms", crawler.grace_period_ms);
    println!(
        "  Retries: {} (base delay {}ms)",
        crawler.max_retries, crawler.retry_base_delay_ms
    );
    println!("  Respect robots.txt: {}", crawler.respect_robots);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  Database: {}",
        config.output.database_path.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Summary: {}",
        config.output.summary_path.as_deref().unwrap_or("(none)")
    );

    println!("\nScope:");
    println!("  Allow: {:?}", config.scope.allow);
    println!("  Deny: {:?}", config.scope.deny);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows the latest run stored in the database
fn handle_stats(config: &Config) -> Result<(), CrawlError> {
    let Some(path) = config.output.database_path.as_deref() else {
        println!("No database configured (use --output or [output] database-path)");
        return Ok(());
    };
    println!("Database: {}\n", path);

    let storage = open_storage(Path::new(path))?;
    match storage.get_latest_run()? {
        Some(run) => {
            println!("Run #{} ({})", run.id, run.status.to_db_string());
            println!("  Config hash: {}", run.config_hash);
            println!();
            print_statistics(&run.stats);
        }
        None => println!("No runs recorded"),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> Result<(), CrawlError> {
    let summary_path = config.output.summary_path.clone().map(PathBuf::from);

    let sqlite = match config.output.database_path.as_deref() {
        Some(path) => {
            let sink = SqliteSink::open(Path::new(path), config_hash)?;
            tracing::info!("Recording run #{} in {}", sink.run_id(), path);
            Some(Arc::new(sink))
        }
        None => None,
    };

    let mut coordinator = Coordinator::new(config)?;
    if let Some(sink) = &sqlite {
        coordinator = coordinator.sink(sink.clone() as Arc<dyn ResultSink>);
    }

    let signals = tokio::spawn(handle_signals(coordinator.shutdown_handle()));
    let report = coordinator.run().await;
    signals.abort();

    print_statistics(&report.stats);
    write_summary(&report, config_hash, summary_path.as_deref());

    if let Some(sink) = sqlite {
        let failed = sink.write_errors();
        if failed > 0 {
            tracing::error!(
                "{} result(s) could not be written to the database for run #{}",
                failed,
                sink.run_id()
            );
        }
    }

    tracing::info!("Crawl finished ({})", report.stop_reason);
    Ok(())
}

/// First Ctrl-C drains the crawl; a second one abandons in-flight fetches
async fn handle_signals(handle: ShutdownHandle) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    tracing::warn!("Interrupt received; draining (press Ctrl-C again to stop immediately)");
    handle.interrupt();

    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Second interrupt; stopping now");
        handle.force_stop();
    }
}

fn write_summary(report: &CrawlReport, config_hash: &str, path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    match generate_markdown_summary(report, Some(config_hash), path) {
        Ok(()) => println!("\n✓ Summary written to: {}", path.display()),
        Err(e) => tracing::error!("Failed to write summary to {}: {}", path.display(), e),
    }
}
