//! Pipeline metrics using the metrics crate.

use axum::{http::StatusCode, response::IntoResponse};
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

#[derive(Clone)]
pub struct MetricsState {
    handle: Option<PrometheusHandle>,
}

impl MetricsState {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self { handle: None };
        }

        let handle = PROMETHEUS_HANDLE.get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("Failed to install Prometheus recorder")
        });

        Self {
            handle: Some(handle.clone()),
        }
    }

    pub fn disabled() -> Self {
        Self { handle: None }
    }

    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(|h| h.render())
    }

    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }
}

pub async fn metrics_handler(
    axum::extract::State(state): axum::extract::State<MetricsState>,
) -> impl IntoResponse {
    match state.render() {
        Some(metrics) => (StatusCode::OK, metrics),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics not enabled".to_string(),
        ),
    }
}

/// Terminal pipeline states, labelled per action.
pub fn record_mutation(action: &'static str, outcome: &'static str) {
    counter!("turnstile_mutations_total", "action" => action, "outcome" => outcome).increment(1);
}

/// Audit appends that failed after a successful mutation. Never surfaces to the
/// caller; this counter is the reconciliation signal.
pub fn record_audit_failure() {
    counter!("turnstile_audit_failures_total").increment(1);
}

/// Fan-out degradation, split by stage: recipient lookup vs per-recipient dispatch.
pub fn record_fanout_failure(stage: &'static str) {
    counter!("turnstile_fanout_failures_total", "stage" => stage).increment(1);
}

pub fn record_notification_created() {
    counter!("turnstile_fanout_notifications_total").increment(1);
}

/// Side-effect jobs rejected because the queue was full or closed.
pub fn record_effect_job_dropped() {
    counter!("turnstile_effect_jobs_dropped_total").increment(1);
}
