use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub mod aggregate;
pub mod app;
pub mod config;
pub mod error;
pub mod executor;
pub mod identity;
pub mod loader;
pub mod reporter;
pub mod scheduler;
pub mod transport;
pub mod validator;

/// Probe endpoint used by the proxy validation mode. It echoes the caller's IP.
pub const DEFAULT_PROBE_URL: &str = "http://httpbin.org/ip";

/// The only status code counted as a success.
pub const SUCCESS_STATUS: u16 = 200;

/// How an outbound request reaches the proxy endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyScheme {
    pub const ALL: [ProxyScheme; 4] = [
        ProxyScheme::Http,
        ProxyScheme::Https,
        ProxyScheme::Socks4,
        ProxyScheme::Socks5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyScheme::Http => "http",
            ProxyScheme::Https => "https",
            ProxyScheme::Socks4 => "socks4",
            ProxyScheme::Socks5 => "socks5",
        }
    }
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proxy endpoint from the pool. Immutable once loaded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyDescriptor {
    /// `host:port`, optionally with `user:pass@` in front.
    pub address: String,
    pub scheme: ProxyScheme,
}

impl ProxyDescriptor {
    pub fn new(scheme: ProxyScheme, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            scheme,
        }
    }

    /// The proxy as a URL, e.g. `socks5://10.0.0.1:1080`.
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.address)
    }
}

impl fmt::Display for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.address)
    }
}

/// Simulated client identity. One identity serves every retry of one proxy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_agent: String,
    pub cookie_name: String,
    pub cookie_value: String,
}

impl RequestIdentity {
    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        format!("{}={}", self.cookie_name, self.cookie_value)
    }
}

/// Category of the last failed attempt of a proxy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Transport,
    Status(u16),
}

/// Terminal result for one proxy after its attempt sequence ends.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    pub proxy: ProxyDescriptor,
    /// `Some(200)` on success, `None` once every attempt failed.
    pub status: Option<u16>,
    /// Full response body on success, last failure description otherwise.
    pub payload: String,
    pub attempts: u32,
    pub failure: Option<FailureKind>,
    /// Time from the start of the pacing delay to the final attempt.
    pub elapsed: Duration,
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        self.status == Some(SUCCESS_STATUS)
    }
}

/// Contiguous slice of the pool owned by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerShard {
    pub id: usize,
    pub proxies: Vec<ProxyDescriptor>,
}

/// Counts over a completed run. `success + failure == total` always holds.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    /// Outcomes that needed more than one attempt.
    pub retried: usize,
    pub total_attempts: u64,
    pub timeouts: usize,
    pub transport_faults: usize,
    pub bad_status: usize,
    pub elapsed: Duration,
}

impl SessionSummary {
    /// Percentage of successful outcomes, 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.success as f64 / self.total as f64) * 100.0
    }

    /// Outcomes per second of wall time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total as f64 / secs
    }
}
