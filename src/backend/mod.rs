pub mod broadcast;
pub mod gateway;
pub mod handlers;
mod middleware;
pub mod realtime;
pub mod response;
mod routes;

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::config::ServerConfig;
use broadcast::BroadcastChannel;
use gateway::Gateway;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub gateway: Gateway,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wires the gateway to a fresh broadcast channel and publishes the
    /// current dashboard so the first subscriber has a snapshot.
    pub async fn new(pool: Pool<Sqlite>, config: ServerConfig) -> anyhow::Result<Self> {
        let channel = BroadcastChannel::new(config.broadcast_capacity);
        let gateway = Gateway::new(pool.clone(), channel);
        gateway.prime().await?;

        Ok(Self {
            db: pool,
            gateway,
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .nest("/api/v1", routes::api_routes())
        .layer(from_fn_with_state(state.clone(), middleware::cors_middleware))
        .layer(from_fn(middleware::request_log_middleware))
        .with_state(state)
}

pub async fn run_server(pool: Pool<Sqlite>, config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.addr();
    let state = AppState::new(pool, config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
