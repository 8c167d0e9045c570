pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::alert::ALERT_PATH;

#[derive(Debug, Default)]
pub struct AppState {
    pub alerts_received: AtomicU64,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(ALERT_PATH, post(handlers::receive_alert))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `host:port` and serve the alert receiver until `shutdown` fires.
pub async fn serve(host: &str, port: u16, shutdown: CancellationToken) -> eyre::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre::eyre!("Failed to bind alert receiver on {}: {}", addr, e))?;
    serve_on(listener, shutdown).await
}

/// Serve on an already bound listener (tests bind port 0).
pub async fn serve_on(listener: TcpListener, shutdown: CancellationToken) -> eyre::Result<()> {
    let addr = listener.local_addr()?;
    let app = router(Arc::new(AppState::default()));
    tracing::info!(%addr, "Alert receiver listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!(%addr, "Alert receiver stopped");
    Ok(())
}
