//! Run configuration. Values come from defaults, then an optional JSON file,
//! then command-line flags.

use crate::error::ConfigError;
use crate::executor::RetryPolicy;
use crate::validator::DEFAULT_CONCURRENCY;
use crate::DEFAULT_PROBE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROXY_FILE: &str = "proxies.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "working_proxies.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub target_url: Option<String>,
    pub proxy_file: PathBuf,
    pub workers: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_ms: u64,
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
    /// Seed for the per-worker RNGs; entropy when absent.
    pub seed: Option<u64>,
    /// JSON report of the completed run.
    pub report: Option<PathBuf>,

    // proxy validation mode
    pub validate_proxies: bool,
    pub probe_url: String,
    pub validation_concurrency: usize,
    pub output_file: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_url: None,
            proxy_file: PathBuf::from(DEFAULT_PROXY_FILE),
            workers: 5,
            max_retries: 3,
            timeout_secs: 10,
            backoff_ms: 1000,
            pacing_min_ms: 500,
            pacing_max_ms: 3000,
            seed: None,
            report: None,
            validate_proxies: false,
            probe_url: DEFAULT_PROBE_URL.to_string(),
            validation_concurrency: DEFAULT_CONCURRENCY,
            output_file: None,
        }
    }
}

impl RunConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::NoRetries);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.validation_concurrency == 0 {
            return Err(ConfigError::NoConcurrency);
        }
        if self.pacing_min_ms > self.pacing_max_ms {
            return Err(ConfigError::InvertedPacing {
                min_ms: self.pacing_min_ms,
                max_ms: self.pacing_max_ms,
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            timeout: self.timeout(),
            backoff: Duration::from_millis(self.backoff_ms),
            pacing_min: Duration::from_millis(self.pacing_min_ms),
            pacing_max: Duration::from_millis(self.pacing_max_ms),
        }
    }

    /// The target URL, trimmed. `None` when missing or blank.
    pub fn target(&self) -> Option<&str> {
        self.target_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_documented_policy() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.proxy_file, PathBuf::from("proxies.txt"));
        assert_eq!(config.workers, 5);
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            RunConfig { workers: 0, ..RunConfig::default() },
            RunConfig { max_retries: 0, ..RunConfig::default() },
            RunConfig { timeout_secs: 0, ..RunConfig::default() },
            RunConfig { validation_concurrency: 0, ..RunConfig::default() },
            RunConfig { pacing_min_ms: 5000, ..RunConfig::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn blank_target_counts_as_missing() {
        let config = RunConfig {
            target_url: Some("   ".to_string()),
            ..RunConfig::default()
        };
        assert_eq!(config.target(), None);

        let config = RunConfig {
            target_url: Some(" https://example.com/video ".to_string()),
            ..RunConfig::default()
        };
        assert_eq!(config.target(), Some("https://example.com/video"));
    }

    #[test]
    fn partial_json_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"workers": 12, "seed": 4}}"#).unwrap();

        let config = RunConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.workers, 12);
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = RunConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
