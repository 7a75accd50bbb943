//! Transaction metrics.
//!
//! # Metrics
//! - `username_pay_transactions_total` (counter): submissions by function, outcome
//! - `username_pay_confirmation_seconds` (histogram): time from broadcast to outcome
//! - `username_pay_rpc_failures_total` (counter): read-client endpoint failures by operation
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every call is a no-op.

use std::time::Duration;

use crate::transactions::outcome::TransactionOutcome;

/// Count one submission result.
pub fn record_outcome(function: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "username_pay_transactions_total",
        "function" => function,
        "outcome" => outcome
    )
    .increment(1);
}

/// Count a confirmation result and record how long the wait took.
pub fn record_confirmation(function: &'static str, elapsed: Duration, outcome: &TransactionOutcome) {
    record_outcome(function, outcome.label());
    ::metrics::histogram!(
        "username_pay_confirmation_seconds",
        "function" => function
    )
    .record(elapsed.as_secs_f64());
}

/// Count one endpoint failure in the read client.
pub fn record_rpc_failure(operation: &'static str, endpoint_idx: usize) {
    ::metrics::counter!(
        "username_pay_rpc_failures_total",
        "operation" => operation,
        "endpoint" => endpoint_idx.to_string()
    )
    .increment(1);
}
