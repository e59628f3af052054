//! Metrics for access decisions
//!
//! Counters are recorded through the `metrics` facade. Installing a recorder
//! (for example the Prometheus exporter in the API server) is up to the binary;
//! without one every call here is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Allowed access checks, labelled by `check`
pub const ACCESS_ALLOWED: &str = "vidspace.access.allowed";

/// Denied access checks, labelled by `check` and `reason`
pub const ACCESS_DENIED: &str = "vidspace.access.denied";

/// Store failures surfaced while evaluating a check
pub const ACCESS_ERRORS: &str = "vidspace.access.errors";

/// Per-RPC handling latency
pub const RPC_DURATION_MS: &str = "vidspace.rpc.duration_ms";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(ACCESS_ALLOWED, "Access checks that passed");
    describe_counter!(ACCESS_DENIED, "Access checks that were rejected");
    describe_counter!(ACCESS_ERRORS, "Access checks aborted by a storage or collaborator failure");
    describe_histogram!(RPC_DURATION_MS, "RPC handling duration in milliseconds");
}

/// Outcome of a single access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(&'static str),
    Failed,
}

/// Record the outcome of `check`
pub fn record_decision(check: &'static str, decision: Decision) {
    match decision {
        Decision::Allowed => counter!(ACCESS_ALLOWED, "check" => check).increment(1),
        Decision::Denied(reason) => {
            counter!(ACCESS_DENIED, "check" => check, "reason" => reason).increment(1)
        }
        Decision::Failed => counter!(ACCESS_ERRORS, "check" => check).increment(1),
    }
}

/// Timer for measuring RPC duration
pub struct Timer {
    method: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(method: &'static str) -> Self {
        Self { method, start: Instant::now() }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        let elapsed = self.start.elapsed();
        histogram!(RPC_DURATION_MS, "method" => self.method).record(elapsed.as_secs_f64() * 1000.0);
    }
}
