use std::time::Duration;

use tracing::Span;

use super::TraceId;

/// Create a root span for a batch / job
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!("root", name = %name, trace_id = %trace_id.as_str())
}

/// Emit a `performance` warning when `elapsed` is above `max`.
///
/// Returns whether the operation was flagged.
pub fn flag_if_slow(label: &'static str, max: Duration, elapsed: Duration) -> bool {
    if elapsed <= max {
        return false;
    }

    tracing::warn!(
        target: "performance",
        label = label,
        elapsed_us = elapsed.as_micros() as u64,
        max_us = max.as_micros() as u64,
        "slow operation detected"
    );
    true
}
