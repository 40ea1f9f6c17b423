//! Clinical decision support web server.
//!
//! Serves the form at `/` and the JSON API under `/api`.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p cdss-web
//! cargo run -p cdss-web -- --port 8080 --secrets /etc/cdss/secrets.toml
//! CDSS_API_KEY=sk-... cargo run -p cdss-web -- --model gpt-4o-mini
//! ```
//!
//! Then open the printed URL in a browser.

use cdss::config::{DEFAULT_SECRETS_PATH, Settings};
use cdss_web::{AppState, WebConfig, spawn_web};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Clinical decision support web server.
#[derive(Parser)]
#[command(about = "Browser form and JSON API for psychiatric decision support")]
struct Args {
    /// Port for the web server.
    #[arg(long, env = "CDSS_PORT", default_value_t = 3001)]
    port: u16,

    /// Bind on all interfaces instead of localhost only.
    #[arg(long)]
    public: bool,

    /// Path to the secrets file.
    #[arg(long, env = "CDSS_SECRETS", default_value = DEFAULT_SECRETS_PATH)]
    secrets: String,

    /// Override the model from the secrets file.
    #[arg(long, env = "CDSS_MODEL")]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cdss=info,cdss_web=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 1. Resolve settings. A broken secrets file blocks LLM calls but still
    //    serves the form, so the banner can explain the problem.
    let state = match Settings::load(&args.secrets) {
        Ok(mut settings) => {
            if let Some(model) = &args.model {
                settings.llm.model = Some(model.clone());
            }
            AppState::from_settings(&settings)
        }
        Err(e) => {
            tracing::error!("{e}");
            AppState::blocked(&e)
        }
    };

    // 2. Spawn the server.
    let host = if args.public { [0, 0, 0, 0] } else { [127, 0, 0, 1] };
    let config = WebConfig {
        bind_addr: (host, args.port).into(),
    };
    let addr = spawn_web(state, config)
        .await
        .map_err(|e| format!("failed to bind port {}: {e}", args.port))?;
    println!("Web UI: http://{addr}");

    // 3. Run until interrupted.
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {e}"))?;
    info!("Shutting down");
    Ok(())
}
