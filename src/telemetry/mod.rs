//! Observability: tracing, metrics, and OpenTelemetry integration.

pub mod metrics;
pub mod tracing;

pub use metrics::{
    metrics_handler, record_audit_failure, record_effect_job_dropped, record_fanout_failure,
    record_mutation, record_notification_created, MetricsState,
};
pub use tracing::init_telemetry;
