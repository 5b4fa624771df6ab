//! One proxy, one identity, up to `max_retries` attempts.

use crate::error::AttemptFailure;
use crate::identity::IdentitySynthesizer;
use crate::reporter::{truncate_payload, NullReporter, Reporter, PAYLOAD_PREVIEW_CHARS};
use crate::transport::{ProxiedRequest, Transport};
use crate::{ProxyDescriptor, RequestOutcome, SUCCESS_STATUS};
use async_trait::async_trait;
use log::debug;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Timing and retry ceiling for one proxy's attempt sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per proxy, including the first. Treated as at least 1.
    pub max_retries: u32,
    /// Bound on each individual attempt.
    pub timeout: Duration,
    /// Fixed wait between consecutive failed attempts.
    pub backoff: Duration,
    /// Pacing delay is drawn uniformly from `pacing_min..=pacing_max`.
    pub pacing_min: Duration,
    pub pacing_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(10),
            backoff: Duration::from_secs(1),
            pacing_min: Duration::from_millis(500),
            pacing_max: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Draw the pacing delay for one proxy.
    pub fn pacing_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.pacing_max <= self.pacing_min {
            return self.pacing_min;
        }
        rng.gen_range(self.pacing_min..=self.pacing_max)
    }
}

/// Suspension point used for pacing and backoff.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    reporter: Arc<dyn Reporter>,
    identities: IdentitySynthesizer,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            reporter: Arc::new(NullReporter),
            identities: IdentitySynthesizer::default(),
            policy,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_identities(mut self, identities: IdentitySynthesizer) -> Self {
        self.identities = identities;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run the full attempt sequence for `proxy` and return its outcome.
    ///
    /// Sleeps one pacing delay up front, stops at the first 200, and sleeps
    /// the fixed backoff only between failed attempts. Attempt faults are
    /// folded into the outcome and never returned as errors.
    pub async fn execute<R>(&self, target_url: &str, proxy: &ProxyDescriptor, rng: &mut R) -> RequestOutcome
    where
        R: Rng + Send + ?Sized,
    {
        let identity = self.identities.next(rng);
        let pacing = self.policy.pacing_delay(rng);
        let max_attempts = self.policy.attempts();
        let started = Instant::now();

        debug!("[{}] pacing {}ms before first attempt", proxy, pacing.as_millis());
        self.sleeper.sleep(pacing).await;

        let mut attempt = 1;
        loop {
            let request = ProxiedRequest {
                url: target_url,
                proxy,
                identity: Some(&identity),
                timeout: self.policy.timeout,
            };

            let failure = match self.transport.get(&request).await {
                Ok(response) if response.status == SUCCESS_STATUS => {
                    let outcome = RequestOutcome {
                        proxy: proxy.clone(),
                        status: Some(SUCCESS_STATUS),
                        payload: response.body,
                        attempts: attempt,
                        failure: None,
                        elapsed: started.elapsed(),
                    };
                    self.reporter.outcome(&outcome);
                    return outcome;
                }
                Ok(response) => AttemptFailure::Status {
                    code: response.status,
                    body: truncate_payload(&response.body, PAYLOAD_PREVIEW_CHARS).to_string(),
                },
                Err(failure) => failure,
            };

            self.reporter.attempt_failed(proxy, attempt, &failure);

            if attempt >= max_attempts {
                let outcome = RequestOutcome {
                    proxy: proxy.clone(),
                    status: None,
                    payload: failure.to_string(),
                    attempts: attempt,
                    failure: Some(failure.kind()),
                    elapsed: started.elapsed(),
                };
                self.reporter.outcome(&outcome);
                return outcome;
            }

            self.sleeper.sleep(self.policy.backoff).await;
            attempt += 1;
        }
    }
}
