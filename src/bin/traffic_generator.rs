//! Proxied traffic generator
//!
//! Run examples:
//! # 5 workers, 3 attempts per proxy, proxies from proxies.txt
//! cargo run --bin traffic_generator -- -u https://example.com/video
//!
//! # 20 workers, reproducible identities and pacing, JSON report
//! cargo run --bin traffic_generator -- -u https://example.com/video -w 20 --seed 7 --report run.json
//!
//! # Only check which proxies work and keep them
//! cargo run --bin traffic_generator -- --validate-proxies --output-file working_proxies.txt

use anyhow::{Context, Result};
use clap::Parser;
use log::error;
use proxy_traffic::app::{ctrl_c, init_logging, until_signal, App};
use proxy_traffic::config::{RunConfig, DEFAULT_OUTPUT_FILE};
use proxy_traffic::error::RunError;
use proxy_traffic::reporter::ConsoleReporter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

#[derive(Parser, Clone)]
#[command(version, about = "Drive GET traffic at one URL through a pool of proxies", long_about = None)]
struct Cli {
    /// URL to send traffic to (asked for interactively if omitted)
    #[arg(short = 'u', long)]
    target_url: Option<String>,

    /// Proxy list, one endpoint per line [default: proxies.txt]
    #[arg(short = 'p', long)]
    proxy_file: Option<PathBuf>,

    /// Number of parallel workers [default: 5]
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Attempts per proxy, including the first [default: 3]
    #[arg(short = 'r', long)]
    retries: Option<u32>,

    /// Per-attempt timeout in seconds [default: 10]
    #[arg(long)]
    timeout: Option<u64>,

    /// Wait between failed attempts in milliseconds [default: 1000]
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Seed for identities and pacing delays
    #[arg(long)]
    seed: Option<u64>,

    /// JSON config file; flags override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write a JSON report of the completed run
    #[arg(long)]
    report: Option<PathBuf>,

    /// Validate the proxy pool instead of generating traffic
    #[arg(long)]
    validate_proxies: bool,

    /// Probe URL for proxy validation [default: http://httpbin.org/ip]
    #[arg(long)]
    probe_url: Option<String>,

    /// Where to save working proxies [default: working_proxies.txt]
    #[arg(short = 'o', long)]
    output_file: Option<PathBuf>,

    /// Concurrent probes during validation [default: 100]
    #[arg(long)]
    concurrent: Option<usize>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };

        if self.target_url.is_some() {
            config.target_url = self.target_url;
        }
        if let Some(path) = self.proxy_file {
            config.proxy_file = path;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(retries) = self.retries {
            config.max_retries = retries;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(backoff) = self.backoff_ms {
            config.backoff_ms = backoff;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.report.is_some() {
            config.report = self.report;
        }
        if let Some(url) = self.probe_url {
            config.probe_url = url;
        }
        if let Some(concurrent) = self.concurrent {
            config.validation_concurrency = concurrent;
        }
        config.validate_proxies |= self.validate_proxies;
        if self.output_file.is_some() {
            config.output_file = self.output_file;
        }
        if config.validate_proxies && config.output_file.is_none() {
            config.output_file = Some(PathBuf::from(DEFAULT_OUTPUT_FILE));
        }

        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// MAIN
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    let app = App::new(config).with_reporter(Arc::new(ConsoleReporter));

    let proxies = app.load_pool()?;

    if app.config().validate_proxies {
        let report = until_signal(app.run_validation(&proxies), ctrl_c()).await?;
        println!("\n🔍 {} of {} proxies are working", report.working().count(), proxies.len());
        return Ok(());
    }

    let target = match app.config().target() {
        Some(url) => url.to_string(),
        None => prompt_target().await?,
    };

    let config = app.config();
    println!("\n📋 CONFIGURATION");
    println!("─────────────────────────────────────────────");
    println!("  Target URL:           {}", target);
    println!("  Proxies:              {}", proxies.len());
    println!("  Workers:              {}", config.workers);
    println!("  Attempts per proxy:   {}", config.max_retries);
    println!("  Timeout:              {} seconds", config.timeout_secs);
    println!("  Backoff:              {} ms", config.backoff_ms);
    println!("  Pacing:               {}-{} ms\n", config.pacing_min_ms, config.pacing_max_ms);

    until_signal(app.run_traffic(&proxies, &target), ctrl_c()).await?;
    Ok(())
}

async fn prompt_target() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Enter the URL to test: ")
        .await
        .context("failed to write prompt")?;
    stdout.flush().await.ok();

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read target URL")?;

    let url = line.trim();
    if url.is_empty() {
        return Err(RunError::MissingTarget.into());
    }
    Ok(url.to_string())
}
