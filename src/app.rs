//! Run orchestration shared by the binaries: load the pool, dispatch,
//! summarize, persist.

use crate::aggregate::{aggregate, flatten};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::executor::{RequestExecutor, Sleeper, TokioSleeper};
use crate::loader::load_proxies;
use crate::reporter::{LogReporter, Reporter};
use crate::scheduler::WorkerScheduler;
use crate::transport::{ReqwestTransport, Transport};
use crate::validator::{write_working, ProbeResult, ProxyValidator};
use crate::{ProxyDescriptor, RequestOutcome, SessionSummary};
use log::{error, info, warn};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: SessionSummary,
    pub outcomes: Vec<RequestOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub summary: SessionSummary,
    pub results: Vec<ProbeResult>,
}

impl ValidationReport {
    pub fn working(&self) -> impl Iterator<Item = &ProxyDescriptor> {
        self.results.iter().filter(|r| r.is_working()).map(|r| &r.proxy)
    }
}

pub struct App {
    config: RunConfig,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    reporter: Arc<dyn Reporter>,
}

impl App {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            transport: Arc::new(ReqwestTransport),
            sleeper: Arc::new(TokioSleeper),
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load the proxy file. A missing or unreadable file is logged and
    /// treated as an empty pool, and an empty pool aborts the run.
    pub fn load_pool(&self) -> Result<Vec<ProxyDescriptor>, RunError> {
        let proxies = match load_proxies(&self.config.proxy_file) {
            Ok(proxies) => proxies,
            Err(e) => {
                error!("❌ {}", e);
                Vec::new()
            }
        };

        if proxies.is_empty() {
            return Err(RunError::EmptyPool);
        }
        Ok(proxies)
    }

    /// Drive every proxy at `target_url` and summarize. Nothing is reported
    /// or written unless the whole run completes.
    pub async fn run_traffic(&self, proxies: &[ProxyDescriptor], target_url: &str) -> Result<RunReport, RunError> {
        self.config.validate()?;

        let target_url = target_url.trim();
        if target_url.is_empty() {
            return Err(RunError::MissingTarget);
        }
        if proxies.is_empty() {
            return Err(RunError::EmptyPool);
        }

        let executor = RequestExecutor::new(Arc::clone(&self.transport), self.config.retry_policy())
            .with_sleeper(Arc::clone(&self.sleeper))
            .with_reporter(Arc::clone(&self.reporter));
        let scheduler = WorkerScheduler::new(Arc::new(executor)).with_seed(self.config.seed);

        info!("🚀 Starting run against {}", target_url);
        let started = Instant::now();
        let per_worker = scheduler.run(target_url, proxies, self.config.workers).await?;
        let elapsed = started.elapsed();

        let outcomes = flatten(per_worker);
        let report = RunReport {
            summary: aggregate(&outcomes, elapsed),
            outcomes,
        };

        if let Some(path) = &self.config.report {
            write_json(path, &report).await?;
        }
        self.reporter.summary(&report.summary);

        Ok(report)
    }

    /// Probe every proxy once against the configured probe URL and, when an
    /// output file is configured, persist the working ones.
    pub async fn run_validation(&self, proxies: &[ProxyDescriptor]) -> Result<ValidationReport, RunError> {
        self.config.validate()?;

        let validator = ProxyValidator::new(Arc::clone(&self.transport))
            .with_reporter(Arc::clone(&self.reporter))
            .with_concurrency(self.config.validation_concurrency)
            .with_timeout(self.config.timeout());

        let started = Instant::now();
        let results = validator.validate(proxies, &self.config.probe_url).await?;
        let report = ValidationReport {
            summary: aggregate(&results, started.elapsed()),
            results,
        };

        if let Some(path) = &self.config.output_file {
            write_working(path, &report.results).await?;
        }
        self.reporter.summary(&report.summary);

        Ok(report)
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RunError> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| RunError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    info!("📄 Report saved to {}", path.display());
    Ok(())
}

/// Race `run` against `signal`. If the signal fires first the run future is
/// dropped, which aborts every worker and its open connections.
pub async fn until_signal<T, F, S>(run: F, signal: S) -> Result<T, RunError>
where
    F: Future<Output = Result<T, RunError>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = run => result,
        _ = signal => {
            warn!("Interrupted, abandoning in-flight requests");
            Err(RunError::Interrupted)
        }
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

/// env_logger with `info` (or `debug` when verbose) unless `RUST_LOG` says
/// otherwise.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();
}
