// rest/mod.rs — Public REST API server.
//
// Axum HTTP server bridging the three task routes to the TaskStore.
// CORS is permissive — the browser client is served from another origin
// during development.
//
// Endpoints:
//   GET    /api/tasks
//   POST   /api/task
//   DELETE /api/task?taskID=<id>
//   GET    /api/health

pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/tasks", get(routes::tasks::list_tasks))
        .route(
            "/api/task",
            post(routes::tasks::create_task).delete(routes::tasks::delete_task),
        )
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
