#![allow(dead_code)]

use async_trait::async_trait;
use proxy_traffic::error::AttemptFailure;
use proxy_traffic::executor::Sleeper;
use proxy_traffic::reporter::Reporter;
use proxy_traffic::transport::{HttpResponse, ProxiedRequest, Transport};
use proxy_traffic::validator::ProbeResult;
use proxy_traffic::{ProxyDescriptor, ProxyScheme, RequestIdentity, RequestOutcome, SessionSummary};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub type Reply = Result<HttpResponse, AttemptFailure>;

pub fn ok(body: &str) -> Reply {
    Ok(HttpResponse {
        status: 200,
        body: body.to_string(),
    })
}

pub fn status(code: u16, body: &str) -> Reply {
    Ok(HttpResponse {
        status: code,
        body: body.to_string(),
    })
}

pub fn timeout() -> Reply {
    Err(AttemptFailure::Timeout)
}

pub fn refused() -> Reply {
    Err(AttemptFailure::Transport("tcp connect error: Connection refused".to_string()))
}

pub fn pool(n: usize) -> Vec<ProxyDescriptor> {
    (1..=n)
        .map(|i| ProxyDescriptor::new(ProxyScheme::Http, format!("p{}:8080", i)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub proxy: String,
    pub identity: Option<RequestIdentity>,
    pub timeout: Duration,
}

/// Transport that replays a per-proxy script, then falls back to a fixed
/// reply. Tracks how many calls overlap.
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Reply,
    latency: Duration,
    calls: Mutex<Vec<Call>>,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn always(reply: Reply) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback: reply,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn ok() -> Self {
        Self::always(ok("ok"))
    }

    pub fn script(self, address: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), replies.into());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &ProxiedRequest<'_>) -> Result<HttpResponse, AttemptFailure> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak.fetch_max(now, Ordering::SeqCst);

        self.calls.lock().unwrap().push(Call {
            url: request.url.to_string(),
            proxy: request.proxy.address.clone(),
            identity: request.identity.cloned(),
            timeout: request.timeout,
        });

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.proxy.address)
            .and_then(|script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        reply
    }
}

/// Records every requested sleep and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub failed_attempts: Mutex<Vec<(String, u32, AttemptFailure)>>,
    pub outcomes: Mutex<Vec<RequestOutcome>>,
    pub probes: Mutex<Vec<ProbeResult>>,
    pub summaries: Mutex<Vec<SessionSummary>>,
}

impl Reporter for RecordingReporter {
    fn attempt_failed(&self, proxy: &ProxyDescriptor, attempt: u32, failure: &AttemptFailure) {
        self.failed_attempts
            .lock()
            .unwrap()
            .push((proxy.address.clone(), attempt, failure.clone()));
    }

    fn outcome(&self, outcome: &RequestOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }

    fn probe(&self, result: &ProbeResult) {
        self.probes.lock().unwrap().push(result.clone());
    }

    fn summary(&self, summary: &SessionSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}
