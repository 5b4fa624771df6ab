//! Error taxonomy for loading, configuration, single attempts and whole runs.

use crate::FailureKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result of a single failed attempt. Consumed by the retry loop, never
/// propagated past the executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("Timeout")]
    Timeout,

    /// Connection refused, TLS, DNS or proxy handshake failure.
    #[error("{0}")]
    Transport(String),

    /// A response arrived but was not a 200. `body` is already truncated.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },
}

impl AttemptFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            AttemptFailure::Timeout => FailureKind::Timeout,
            AttemptFailure::Transport(_) => FailureKind::Transport,
            AttemptFailure::Status { code, .. } => FailureKind::Status(*code),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("proxy file '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read proxy file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyParseError {
    #[error("empty proxy address")]
    EmptyAddress,

    #[error("unsupported proxy scheme '{0}'")]
    UnsupportedScheme(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("retry count must be at least 1")]
    NoRetries,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("validation concurrency must be at least 1")]
    NoConcurrency,

    #[error("pacing range is inverted: {min_ms}ms > {max_ms}ms")]
    InvertedPacing { min_ms: u64, max_ms: u64 },

    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Faults outside the per-proxy retry loop. Any of these aborts the run
/// without a summary.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no proxies loaded, make sure the proxy file is correct")]
    EmptyPool,

    #[error("no valid target URL supplied")]
    MissingTarget,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("worker pool closed before all shards were dispatched")]
    PoolClosed,

    #[error("run interrupted")]
    Interrupted,

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}
