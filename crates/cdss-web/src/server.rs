//! Axum server setup and router construction.

use std::net::SocketAddr;

use axum::Router;
use axum::response::Html;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::api::{self, AppState};
use crate::page::INDEX_HTML;

/// Build the full axum router.
///
/// The router serves:
/// - The form page at `/`
/// - REST API at `/api/*`
pub fn build_router(state: AppState) -> Router {
    // CORS layer so the API can be driven from another origin during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/api/status", get(api::get_status))
        .route("/api/catalog", get(api::get_catalog))
        .route("/api/sessions", post(api::post_session))
        .route("/api/sessions/{id}", delete(api::delete_session))
        .route("/api/sessions/{id}/history", get(api::get_history))
        .route(
            "/api/sessions/{id}/recommendations",
            post(api::post_recommendation),
        )
        .route("/api/sessions/{id}/questions", post(api::post_question))
        .with_state(state)
        .layer(cors)
}

/// Bind `bind_addr`, serve `router` on a background task, and return the
/// bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Web server stopped: {e}");
        }
    });

    Ok(addr)
}
