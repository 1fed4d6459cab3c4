//! Metrics collection for `procdeck`.
//!
//! Provides Prometheus-compatible metrics and typed convenience functions
//! for recording measurements. Every label value comes from a closed enum
//! (`StepResult`, `RunStatus`), so label cardinality is bounded by
//! construction and no sanitization layer is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::ProcdeckError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint (metrics are recorded internally and can be read
/// programmatically).
///
/// # Errors
///
/// Returns `ProcdeckError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), ProcdeckError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| ProcdeckError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "procdeck_steps_total",
        "Total number of resolved procedure steps by outcome"
    );
    describe_counter!(
        "procdeck_runs_total",
        "Total number of finished preset runs by final status"
    );
    describe_counter!("procdeck_ticks_total", "Total number of engine ticks");
    describe_histogram!(
        "procdeck_step_duration_ms",
        "Wait time accumulated per resolved step in milliseconds"
    );
    describe_gauge!(
        "procdeck_run_active",
        "Whether a preset run is currently active (1 = active)"
    );
    describe_gauge!(
        "procdeck_run_progress_percent",
        "Progress of the active preset run in percent"
    );
}

/// Records a resolved step.
///
/// `outcome` is a [`StepResult`](crate::run::StepResult) label
/// (`skipped`, `satisfied`, `timed_out`, `failed`).
pub fn record_step(outcome: &'static str, elapsed: Duration) {
    counter!("procdeck_steps_total", "outcome" => outcome).increment(1);
    histogram!("procdeck_step_duration_ms", "outcome" => outcome)
        .record(elapsed.as_secs_f64() * 1000.0);
}

/// Records a finished run by final status.
pub fn record_run_finished(status: &'static str) {
    counter!("procdeck_runs_total", "status" => status).increment(1);
}

/// Records one engine tick.
pub fn record_tick() {
    counter!("procdeck_ticks_total").increment(1);
}

/// Sets whether a run is currently active.
pub fn set_run_active(active: bool) {
    gauge!("procdeck_run_active").set(if active { 1.0 } else { 0.0 });
}

/// Sets the active run's progress percentage.
pub fn set_run_progress(percent: f64) {
    gauge!("procdeck_run_progress_percent").set(percent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // metrics macros silently no-op when no global recorder is installed
        record_step("satisfied", Duration::from_millis(420));
        record_step("timed_out", Duration::from_secs(2));
        record_run_finished("completed");
        record_tick();
        set_run_active(true);
        set_run_progress(41.7);
        set_run_active(false);
    }
}
