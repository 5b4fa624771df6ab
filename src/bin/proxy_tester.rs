//! Proxy pool checker
//!
//! Run examples:
//! # Probe every proxy in proxies.txt, 100 at a time
//! cargo run --bin proxy_tester
//!
//! # Keep the working ones
//! cargo run --bin proxy_tester -- --save-working --output-file working_proxies.txt

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use proxy_traffic::app::{ctrl_c, init_logging, until_signal, App};
use proxy_traffic::config::{RunConfig, DEFAULT_OUTPUT_FILE, DEFAULT_PROXY_FILE};
use proxy_traffic::reporter::LogReporter;
use proxy_traffic::validator::DEFAULT_CONCURRENCY;
use proxy_traffic::DEFAULT_PROBE_URL;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(version, about = "Check which proxies can reach a probe URL", long_about = None)]
struct Cli {
    /// Path to the proxy file
    #[arg(long, default_value = DEFAULT_PROXY_FILE)]
    proxy_file: PathBuf,

    /// URL to test proxies against
    #[arg(long, default_value = DEFAULT_PROBE_URL)]
    test_url: String,

    /// Number of concurrent proxy tests
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrent: usize,

    /// Save working proxies to a file
    #[arg(long)]
    save_working: bool,

    /// File to save working proxies
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output_file: PathBuf,

    /// Per-probe timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

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
    let config = RunConfig {
        proxy_file: cli.proxy_file,
        probe_url: cli.test_url,
        validation_concurrency: cli.concurrent,
        timeout_secs: cli.timeout,
        output_file: cli.save_working.then_some(cli.output_file),
        validate_proxies: true,
        ..RunConfig::default()
    };
    config.validate()?;

    let app = App::new(config).with_reporter(Arc::new(LogReporter));
    let proxies = app.load_pool()?;
    let report = until_signal(app.run_validation(&proxies), ctrl_c()).await?;

    info!("📊 Test Summary");
    info!("Total Proxies Tested: {}", report.summary.total);
    info!("Working Proxies: {}", report.summary.success);
    info!("Failed Proxies: {}", report.summary.failure);
    Ok(())
}
