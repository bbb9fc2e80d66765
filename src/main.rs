use std::sync::Arc;

use tracing::{error, info, warn};
use turnstile::{
    auth::SessionVerifier, create_router, init_tracing, shutdown_telemetry, store::MemoryStore,
    AppState, Config, Stores,
};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    init_tracing(&config);

    info!(
        service = "turnstile",
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "Starting server"
    );

    let issues = config.validate_for_production();
    if !issues.is_empty() {
        for issue in &issues {
            warn!(issue = %issue, "Configuration warning");
        }
    }

    let verifier = match &config.session.public_key_b64 {
        Some(key) => SessionVerifier::from_public_key_b64(
            key,
            config.session.issuer.clone(),
            config.session.audience.clone(),
        )
        .unwrap_or_else(|e| {
            error!(error = %e, "Invalid SESSION_PUBLIC_KEY");
            std::process::exit(1);
        }),
        None => {
            error!("SESSION_PUBLIC_KEY must be set; sessions are verified against the auth service's public key");
            std::process::exit(1);
        }
    };

    let store = Arc::new(MemoryStore::new());
    if config.store.seed_demo_data {
        let (downtown, riverside) = store.seed_demo().await;
        info!(
            downtown_branch = %downtown,
            riverside_branch = %riverside,
            "Demo data seeded"
        );
    }

    let (state, effects) = AppState::new(Stores::in_memory(store), verifier, &config);
    let app = create_router(state, &config);

    let http_addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, address = %http_addr, "Failed to bind HTTP server");
            std::process::exit(1);
        });

    info!(
        http_address = %http_addr,
        docs_url = %format!("http://{}/swagger-ui", http_addr),
        "HTTP server ready"
    );

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
    };

    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await;

    if let Err(e) = result {
        error!(error = %e, "HTTP server error");
    }

    info!("Draining side-effect worker...");
    effects.shutdown().await;

    shutdown_telemetry();

    info!("Server shutdown complete");
}
