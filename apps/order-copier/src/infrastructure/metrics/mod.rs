//! Prometheus Metrics Module
//!
//! Exposes replication metrics in Prometheus format.
//!
//! # Metrics
//!
//! - **Events**: source events received, by status, and events ignored
//! - **Orders**: destination orders placed and placement latency
//! - **Failures**: per-event failures, by pipeline stage
//! - **Stream**: current stream lifecycle state
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on `COPIER_METRICS_PORT`. A port of
//! zero installs the recorder without starting the listener.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to install the Prometheus recorder or listener.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Install the Prometheus recorder.
///
/// Must be called from within a Tokio runtime when `port` is non-zero.
/// Subsequent calls are no-ops.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed or the listener
/// cannot bind.
pub fn init_metrics(port: u16) -> Result<(), MetricsError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let builder = PrometheusBuilder::new();
    if port == 0 {
        builder
            .install_recorder()
            .map_err(|e| MetricsError::Installation(e.to_string()))?;
        tracing::info!("Prometheus recorder installed, listener disabled");
    } else {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        builder
            .with_http_listener(addr)
            .install()
            .map_err(|e| MetricsError::Installation(e.to_string()))?;
        tracing::info!(%addr, "Prometheus metrics exporter started");
    }

    let _ = INSTALLED.set(());
    register_metrics();
    Ok(())
}

fn register_metrics() {
    describe_counter!(
        "order_copier_events_received_total",
        "Order events received from the source account"
    );
    describe_counter!(
        "order_copier_events_ignored_total",
        "Order events skipped by the eligibility filter"
    );
    describe_counter!(
        "order_copier_orders_submitted_total",
        "Orders accepted by the destination account"
    );
    describe_counter!(
        "order_copier_failures_total",
        "Events dropped after a translation or submission failure"
    );
    describe_histogram!(
        "order_copier_submission_seconds",
        "Time from order placement request to destination response"
    );
    describe_gauge!(
        "order_copier_stream_state",
        "Stream state (0 disconnected, 1 connecting, 2 streaming, 3 closing)"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Pipeline stage at which an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Event could not be translated.
    Translation,
    /// Destination refused or failed the order.
    Submission,
}

impl FailureStage {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Submission => "submission",
        }
    }
}

/// Record an order event received from the source.
pub fn record_event_received(status: &str) {
    counter!(
        "order_copier_events_received_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an event skipped by the filter.
pub fn record_event_ignored() {
    counter!("order_copier_events_ignored_total").increment(1);
}

/// Record a destination order placement and its latency.
pub fn record_order_submitted(duration: Duration) {
    counter!("order_copier_orders_submitted_total").increment(1);
    histogram!("order_copier_submission_seconds").record(duration.as_secs_f64());
}

/// Record a dropped event.
pub fn record_failure(stage: FailureStage) {
    counter!(
        "order_copier_failures_total",
        "stage" => stage.as_str()
    )
    .increment(1);
}

/// Update the stream state gauge.
pub fn set_stream_state(code: u8) {
    gauge!("order_copier_stream_state").set(f64::from(code));
}
