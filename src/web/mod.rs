use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::scheduler::CheckScheduler;

pub mod handlers;
pub mod responses;

pub use handlers::{
    api_start, api_status, api_stop, health_check, index_page, start_watch, stop_watch,
};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<CheckScheduler>,
    pub config: Arc<AppConfig>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Form actions
        .route("/", get(index_page))
        .route("/start", post(start_watch))
        .route("/stop", post(stop_watch))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/start", post(api_start))
        .route("/stop", post(api_stop))
}

/// Serve the form until Ctrl-C, then stop the scheduler and wait for any
/// in-flight cycle.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr =
        format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    let scheduler = Arc::clone(&state.scheduler);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Form available at http://{}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
