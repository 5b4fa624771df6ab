//! Proxy pool validation: probe each proxy once under a global limit and
//! keep the ones that answer 200.

use crate::error::RunError;
use crate::reporter::{truncate_payload, NullReporter, Reporter, PAYLOAD_PREVIEW_CHARS};
use crate::transport::{ProxiedRequest, Transport};
use crate::{FailureKind, ProxyDescriptor, SUCCESS_STATUS};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 100;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub proxy: ProxyDescriptor,
    pub status: Option<u16>,
    /// Truncated body on a response, error text otherwise.
    pub detail: String,
    pub failure: Option<FailureKind>,
}

impl ProbeResult {
    pub fn is_working(&self) -> bool {
        self.status == Some(SUCCESS_STATUS)
    }
}

pub struct ProxyValidator {
    transport: Arc<dyn Transport>,
    reporter: Arc<dyn Reporter>,
    concurrency: usize,
    timeout: Duration,
}

impl ProxyValidator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            reporter: Arc::new(NullReporter),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe every proxy with a single GET to `probe_url`. Results come back
    /// in completion order.
    pub async fn validate(&self, proxies: &[ProxyDescriptor], probe_url: &str) -> Result<Vec<ProbeResult>, RunError> {
        if proxies.is_empty() {
            return Err(RunError::EmptyPool);
        }

        info!(
            "Probing {} proxies against {} ({} at a time)",
            proxies.len(),
            probe_url,
            self.concurrency
        );

        let limit = Arc::new(Semaphore::new(self.concurrency));
        let probe_url: Arc<str> = Arc::from(probe_url);
        let mut probes = JoinSet::new();

        for proxy in proxies.iter().cloned() {
            let limit = Arc::clone(&limit);
            let transport = Arc::clone(&self.transport);
            let probe_url = Arc::clone(&probe_url);
            let timeout = self.timeout;

            probes.spawn(async move {
                let _permit = limit.acquire_owned().await.map_err(|_| RunError::PoolClosed)?;
                Ok::<_, RunError>(probe(transport.as_ref(), &probe_url, proxy, timeout).await)
            });
        }

        let mut results = Vec::with_capacity(proxies.len());
        while let Some(joined) = probes.join_next().await {
            let result = joined??;
            self.reporter.probe(&result);
            results.push(result);
        }

        Ok(results)
    }
}

async fn probe(transport: &dyn Transport, probe_url: &str, proxy: ProxyDescriptor, timeout: Duration) -> ProbeResult {
    let request = ProxiedRequest {
        url: probe_url,
        proxy: &proxy,
        identity: None,
        timeout,
    };

    let (status, detail, failure) = match transport.get(&request).await {
        Ok(response) => {
            let failure = (response.status != SUCCESS_STATUS).then_some(FailureKind::Status(response.status));
            let detail = truncate_payload(&response.body, PAYLOAD_PREVIEW_CHARS).to_string();
            (Some(response.status), detail, failure)
        }
        Err(e) => (None, e.to_string(), Some(e.kind())),
    };

    ProbeResult {
        proxy,
        status,
        detail,
        failure,
    }
}

/// Write the working proxies, one URL per line. Returns how many were written.
pub async fn write_working(path: impl AsRef<Path>, results: &[ProbeResult]) -> Result<usize, RunError> {
    let path = path.as_ref();
    let working: Vec<String> = results
        .iter()
        .filter(|r| r.is_working())
        .map(|r| r.proxy.url())
        .collect();

    let mut content = working.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|source| RunError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    info!("🔍 Found {} working proxies. Saved to {}.", working.len(), path.display());
    Ok(working.len())
}
