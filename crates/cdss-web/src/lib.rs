//! Browser form and JSON API for the `cdss` consultation core.
//!
//! `cdss-web` serves a single-page form at `/` and a REST API under `/api`.
//! Each browser tab opens a session, submits the clinical form for a
//! sectioned recommendation, then asks follow-up questions against the same
//! session.
//!
//! # Quick start
//!
//! ```ignore
//! use cdss::config::Settings;
//! use cdss_web::{AppState, WebConfig, spawn_web};
//!
//! let settings = Settings::load("secrets.toml")?;
//! let state = AppState::from_settings(&settings);
//! let addr = spawn_web(state, WebConfig::default()).await?;
//! println!("Web UI: http://{addr}");
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/` | Form page |
//! | GET | `/api/status` | Credential banner state |
//! | GET | `/api/catalog` | Categories, symptoms, severities, section labels |
//! | POST | `/api/sessions` | Open a session |
//! | DELETE | `/api/sessions/{id}` | End a session |
//! | GET | `/api/sessions/{id}/history` | Conversation log |
//! | POST | `/api/sessions/{id}/recommendations` | Submit the form |
//! | POST | `/api/sessions/{id}/questions` | Ask a follow-up |
//!
//! Without a credential the server still starts: `/api/status` reports the
//! problem and the two LLM endpoints answer 503.

mod api;
mod page;
mod server;
pub mod sessions;

pub use api::{ApiError, AppState};
pub use server::build_router;
pub use sessions::SessionStore;

use std::net::SocketAddr;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(state: AppState, config: WebConfig) -> std::io::Result<SocketAddr> {
    let router = server::build_router(state);
    server::start_server(router, config.bind_addr).await
}
