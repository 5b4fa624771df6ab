//! Observers for attempts, outcomes and summaries.
//!
//! The engine never prints. It calls a [`Reporter`], and the binaries decide
//! whether that means log lines, console lines or nothing.

use crate::error::AttemptFailure;
use crate::validator::ProbeResult;
use crate::{ProxyDescriptor, RequestOutcome, SessionSummary};
use log::{debug, error, info, warn};

/// Characters of a payload shown per console line.
pub const PAYLOAD_PREVIEW_CHARS: usize = 100;

pub trait Reporter: Send + Sync {
    fn attempt_failed(&self, _proxy: &ProxyDescriptor, _attempt: u32, _failure: &AttemptFailure) {}

    fn outcome(&self, _outcome: &RequestOutcome) {}

    fn probe(&self, _result: &ProbeResult) {}

    fn summary(&self, _summary: &SessionSummary) {}
}

/// Swallows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Routes every event through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn attempt_failed(&self, proxy: &ProxyDescriptor, attempt: u32, failure: &AttemptFailure) {
        debug!("[{}] attempt {} failed: {}", proxy, attempt, failure);
    }

    fn outcome(&self, outcome: &RequestOutcome) {
        if outcome.is_success() {
            info!(
                "[{}] 200 after {} attempt(s) in {}ms",
                outcome.proxy,
                outcome.attempts,
                outcome.elapsed.as_millis()
            );
        } else {
            warn!(
                "[{}] gave up after {} attempt(s): {}",
                outcome.proxy,
                outcome.attempts,
                truncate_payload(&outcome.payload, PAYLOAD_PREVIEW_CHARS)
            );
        }
    }

    fn probe(&self, result: &ProbeResult) {
        match result.status {
            Some(200) => info!("Proxy: {} | Status: 200", result.proxy),
            Some(status) => warn!("Proxy: {} | Status: {}", result.proxy, status),
            None => error!("Proxy: {} | Error: {}", result.proxy, result.detail),
        }
    }

    fn summary(&self, summary: &SessionSummary) {
        info!(
            "total={} success={} failure={} retried={} elapsed={:.2}s",
            summary.total,
            summary.success,
            summary.failure,
            summary.retried,
            summary.elapsed.as_secs_f64()
        );
    }
}

/// One stdout line per outcome plus a summary block. Attempt-level noise
/// goes to the log at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn attempt_failed(&self, proxy: &ProxyDescriptor, attempt: u32, failure: &AttemptFailure) {
        LogReporter.attempt_failed(proxy, attempt, failure);
    }

    fn outcome(&self, outcome: &RequestOutcome) {
        println!("{}", outcome_line(outcome));
    }

    fn probe(&self, result: &ProbeResult) {
        let marker = match result.status {
            Some(200) => "✅",
            Some(_) => "⚠️",
            None => "❌",
        };
        println!(
            "{} Proxy: {} | Status: {} | {}",
            marker,
            result.proxy,
            status_text(result.status),
            truncate_payload(&result.detail, PAYLOAD_PREVIEW_CHARS)
        );
    }

    fn summary(&self, summary: &SessionSummary) {
        println!("\n📊 SUMMARY");
        println!("─────────────────────────────────────────────");
        println!("  Total Requests:       {}", summary.total);
        println!("  Successful (200):     {} ({:.2}%)", summary.success, summary.success_rate());
        println!("  Failed:               {}", summary.failure);
        println!("    Timeouts:           {}", summary.timeouts);
        println!("    Transport Faults:   {}", summary.transport_faults);
        println!("    Non-200 Status:     {}", summary.bad_status);
        println!("  Retried:              {}", summary.retried);
        println!("  Total Attempts:       {}", summary.total_attempts);
        println!("  Elapsed:              {:.2} seconds", summary.elapsed.as_secs_f64());
        println!("  Throughput:           {:.2} requests/second", summary.throughput());
    }
}

/// `Proxy: <url> | Status: <code|None> | Info: <first 100 chars>`
pub fn outcome_line(outcome: &RequestOutcome) -> String {
    format!(
        "Proxy: {} | Status: {} | Info: {}",
        outcome.proxy,
        status_text(outcome.status),
        truncate_payload(&outcome.payload, PAYLOAD_PREVIEW_CHARS)
    )
}

fn status_text(status: Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "None".to_string(),
    }
}

/// First `max_chars` characters of `payload`, cut on a char boundary.
pub fn truncate_payload(payload: &str, max_chars: usize) -> &str {
    match payload.char_indices().nth(max_chars) {
        Some((idx, _)) => &payload[..idx],
        None => payload,
    }
}
