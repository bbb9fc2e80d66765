//! Turnstile - Branch-scoped mutation pipeline for a multi-branch gym platform.
//!
//! Every tenant-scoped write runs the same three stages: scope resolution,
//! mutation through the store collaborators, then best-effort audit and
//! branch-admin fan-out on a background worker.

pub mod audit;
pub mod auth;
pub mod config;
pub mod effects;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod openapi;
pub mod pagination;
pub mod pipeline;
pub mod scope;
pub mod store;
pub mod telemetry;

use axum::{
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};

use std::sync::Arc;
use std::time::Duration;

use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use audit::AuditRecorder;
use auth::SessionVerifier;
use effects::{SideEffectHandle, SideEffectWorker};
use error::ApiError;
use middleware::request_id::request_id_middleware;
use notify::NotificationFanout;
use pipeline::MutationOrchestrator;
use store::{
    AdminDirectory, AuditStore, LeadStore, MemberStore, MemoryStore, NotificationStore, StaffStore,
};
use telemetry::MetricsState;

/// The external store collaborators, one handle per concern. A deployment
/// substitutes its own implementations; [`Stores::in_memory`] wires every seam
/// to the bundled reference store.
#[derive(Clone)]
pub struct Stores {
    pub members: Arc<dyn MemberStore>,
    pub leads: Arc<dyn LeadStore>,
    pub staff: Arc<dyn StaffStore>,
    pub directory: Arc<dyn AdminDirectory>,
    pub audit: Arc<dyn AuditStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            members: store.clone(),
            leads: store.clone(),
            staff: store.clone(),
            directory: store.clone(),
            audit: store.clone(),
            notifications: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub orchestrator: MutationOrchestrator,
    pub verifier: Arc<SessionVerifier>,
    pub metrics: MetricsState,
}

impl AppState {
    /// Builds the application state and spawns the side-effect worker. The
    /// returned handle drains queued audit/fan-out jobs on shutdown.
    pub fn new(
        stores: Stores,
        verifier: SessionVerifier,
        config: &Config,
    ) -> (Self, SideEffectHandle) {
        let recorder = AuditRecorder::new(stores.audit.clone());
        let fanout = NotificationFanout::new(stores.directory.clone(), stores.notifications.clone());
        let (queue, handle) =
            SideEffectWorker::spawn(recorder, fanout, config.effects.queue_capacity);

        let metrics = MetricsState::new(config.telemetry.metrics_enabled);

        (
            Self {
                stores,
                orchestrator: MutationOrchestrator::new(queue),
                verifier: Arc::new(verifier),
                metrics,
            },
            handle,
        )
    }
}

pub fn create_router(state: AppState, config: &config::Config) -> Router {
    let cors = build_cors_layer(config);
    let body_limit = RequestBodyLimitLayer::new(config.server.max_body_size);

    #[allow(deprecated)]
    let timeout = TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let metrics_state = state.metrics.clone();
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check_simple))
        .route("/health/status", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::ready_check))
        .route("/health/live", get(handlers::health::live_check))
        .route(
            "/metrics",
            get(telemetry::metrics::metrics_handler).with_state(metrics_state),
        )
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/members", post(handlers::members::create_member))
        .route("/members", get(handlers::members::list_members))
        .route("/members/{id}", put(handlers::members::update_member))
        .route("/members/{id}", delete(handlers::members::delete_member))
        .route("/leads", post(handlers::leads::create_lead))
        .route("/leads", get(handlers::leads::list_leads))
        .route("/leads/{id}", put(handlers::leads::update_lead))
        .route("/leads/{id}", delete(handlers::leads::delete_lead))
        .route("/leads/{id}/assign", put(handlers::leads::assign_lead))
        .route("/staff", post(handlers::staff::create_staff))
        .route("/staff", get(handlers::staff::list_staff))
        .route("/staff/{id}", put(handlers::staff::update_staff))
        .route("/staff/{id}", delete(handlers::staff::delete_staff))
        .route("/audit", get(handlers::audit_log::list_audit_entries))
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ))
        .with_state(state.clone());

    let docs_routes = openapi::swagger_router();

    Router::new()
        .merge(docs_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(fallback_handler)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(timeout)
        .layer(body_limit)
        .layer(cors)
}

async fn fallback_handler() -> impl IntoResponse {
    ApiError::not_found("Route not found", "NOT_FOUND")
}

fn build_cors_layer(config: &config::Config) -> CorsLayer {
    use axum::http::header::HeaderName;
    use axum::http::Method;

    let is_wildcard_origin = config.cors.allowed_origins.contains(&"*".to_string())
        || config.cors.allowed_origins.is_empty();

    let methods: Vec<Method> = config
        .cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    let headers: Vec<HeaderName> = config
        .cors
        .allowed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();

    if config.cors.allow_credentials && is_wildcard_origin {
        CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::mirror_request())
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
            .max_age(Duration::from_secs(config.cors.max_age_secs))
    } else if config.cors.allow_credentials {
        let origins: Vec<_> = config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
            .max_age(Duration::from_secs(config.cors.max_age_secs))
    } else {
        let cors = if is_wildcard_origin {
            CorsLayer::new().allow_origin(Any)
        } else {
            let origins: Vec<_> = config
                .cors
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new().allow_origin(origins)
        };

        cors.allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(false)
            .max_age(Duration::from_secs(config.cors.max_age_secs))
    }
}

pub fn init_tracing(config: &config::Config) {
    telemetry::init_telemetry(config);
}

pub use config::Config;
pub use telemetry::tracing::shutdown_telemetry;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
        assert_clone::<Stores>();
    }

    #[test]
    fn test_build_cors_layer_wildcard() {
        let mut config = Config::default_for_testing();
        config.cors.allowed_origins = vec!["*".to_string()];
        let _ = build_cors_layer(&config);
    }

    #[test]
    fn test_build_cors_layer_specific_origins() {
        let mut config = Config::default_for_testing();
        config.cors.allowed_origins = vec![
            "http://localhost:3000".to_string(),
            "https://example.com".to_string(),
        ];
        let _ = build_cors_layer(&config);
    }

    #[test]
    fn test_build_cors_layer_credentials_with_wildcard() {
        let mut config = Config::default_for_testing();
        config.cors.allowed_origins = vec!["*".to_string()];
        config.cors.allow_credentials = true;
        let _ = build_cors_layer(&config);
    }
}
