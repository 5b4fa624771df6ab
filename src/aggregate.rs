//! Flattening per-worker results and counting them.

use crate::validator::ProbeResult;
use crate::{FailureKind, RequestOutcome, SessionSummary};
use std::time::Duration;

/// Anything the summary can count.
pub trait Tally {
    fn succeeded(&self) -> bool;
    fn attempts(&self) -> u32;
    fn failure(&self) -> Option<FailureKind>;
}

impl Tally for RequestOutcome {
    fn succeeded(&self) -> bool {
        self.is_success()
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }

    fn failure(&self) -> Option<FailureKind> {
        self.failure
    }
}

impl Tally for ProbeResult {
    fn succeeded(&self) -> bool {
        self.is_working()
    }

    fn attempts(&self) -> u32 {
        1
    }

    fn failure(&self) -> Option<FailureKind> {
        self.failure
    }
}

/// Concatenate worker results in worker order, keeping shard order inside
/// each worker.
pub fn flatten(per_worker: Vec<Vec<RequestOutcome>>) -> Vec<RequestOutcome> {
    per_worker.into_iter().flatten().collect()
}

/// Count successes and failures. The result does not depend on the order of
/// `items`.
pub fn aggregate<T: Tally>(items: &[T], elapsed: Duration) -> SessionSummary {
    let mut summary = SessionSummary {
        elapsed,
        ..SessionSummary::default()
    };

    for item in items {
        summary.total += 1;
        summary.total_attempts += u64::from(item.attempts());
        if item.attempts() > 1 {
            summary.retried += 1;
        }

        if item.succeeded() {
            summary.success += 1;
            continue;
        }

        match item.failure() {
            Some(FailureKind::Timeout) => summary.timeouts += 1,
            Some(FailureKind::Status(_)) => summary.bad_status += 1,
            Some(FailureKind::Transport) | None => summary.transport_faults += 1,
        }
    }

    summary.failure = summary.total - summary.success;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProxyDescriptor, ProxyScheme};

    fn outcome(id: usize, status: Option<u16>, attempts: u32, failure: Option<FailureKind>) -> RequestOutcome {
        RequestOutcome {
            proxy: ProxyDescriptor::new(ProxyScheme::Http, format!("10.1.0.{}:3128", id)),
            status,
            payload: String::new(),
            attempts,
            failure,
            elapsed: Duration::from_millis(10),
        }
    }

    fn mixed() -> Vec<RequestOutcome> {
        vec![
            outcome(1, Some(200), 1, None),
            outcome(2, Some(200), 2, None),
            outcome(3, None, 3, Some(FailureKind::Timeout)),
            outcome(4, None, 3, Some(FailureKind::Status(503))),
            outcome(5, None, 3, Some(FailureKind::Transport)),
        ]
    }

    #[test]
    fn counts_add_up() {
        let summary = aggregate(&mixed(), Duration::from_secs(2));
        assert_eq!(summary.total, 5);
        assert_eq!(summary.success, 2);
        assert_eq!(summary.failure, 3);
        assert_eq!(summary.success + summary.failure, summary.total);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.bad_status, 1);
        assert_eq!(summary.transport_faults, 1);
        assert_eq!(summary.retried, 4);
        assert_eq!(summary.total_attempts, 12);
        assert_eq!(summary.elapsed, Duration::from_secs(2));
    }

    #[test]
    fn order_does_not_matter() {
        let items = mixed();
        let expected = aggregate(&items, Duration::ZERO);

        // every rotation and its reverse
        for shift in 0..items.len() {
            let mut rotated = items.clone();
            rotated.rotate_left(shift);
            assert_eq!(aggregate(&rotated, Duration::ZERO), expected);
            rotated.reverse();
            assert_eq!(aggregate(&rotated, Duration::ZERO), expected);
        }
    }

    #[test]
    fn empty_input() {
        let summary = aggregate::<RequestOutcome>(&[], Duration::ZERO);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.failure, 0);
        assert_eq!(summary.success_rate(), 0.0);
        assert_eq!(summary.throughput(), 0.0);
    }

    #[test]
    fn flatten_keeps_worker_then_shard_order() {
        let per_worker = vec![
            vec![outcome(1, Some(200), 1, None), outcome(2, Some(200), 1, None)],
            vec![],
            vec![outcome(3, Some(200), 1, None)],
        ];
        let flat = flatten(per_worker);
        let addresses: Vec<&str> = flat.iter().map(|o| o.proxy.address.as_str()).collect();
        assert_eq!(addresses, ["10.1.0.1:3128", "10.1.0.2:3128", "10.1.0.3:3128"]);
    }
}
