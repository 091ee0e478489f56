//! Passgate Server - WebAuthn ceremony verification over HTTP
//!
//! Endpoints:
//! - POST /webauthn/register/{start,finish} - Registration ceremony
//! - POST /webauthn/login/{start,finish} - Authentication ceremony
//! - GET /health, /ready - Monitoring
//! - GET /api-docs/openapi.json - OpenAPI document

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use passgate_core::{MockEntropy, RelyingPartyBuilder};
use passgate_server::{create_router_with_state, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passgate_server=info,passgate_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let mut builder = RelyingPartyBuilder::from_env().context("invalid relying party settings")?;
    if config.mock_entropy {
        builder = builder.entropy_source(Arc::new(MockEntropy::default()));
    }
    let relying_party = builder.build().context("failed to build relying party")?;

    tracing::info!(
        rp_id = %relying_party.config().rp_id,
        entropy = %relying_party.entropy_source(),
        timeout_ms = relying_party.config().timeout.as_millis() as u64,
        "Relying party configured"
    );

    let state = AppState::in_memory(relying_party);
    spawn_session_sweeper(&state, &config);

    let app = create_router_with_state(&config, state)?;

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Passgate server listening on http://{}", addr);

    // Peer addresses feed the rate limiter's key extractor
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Periodically drop sessions whose ceremony was never finished
fn spawn_session_sweeper(state: &AppState, config: &Config) {
    let sessions = Arc::clone(&state.sessions);
    let mut interval = tokio::time::interval(config.session_sweep_interval());

    tokio::spawn(async move {
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = sessions.len(), "Swept expired sessions");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Graceful shutdown initiated");
}
