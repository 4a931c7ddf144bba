use std::sync::Arc;

use arena::api;
use arena::app_state::AppState;
use arena::config::Config;
use arena::driver::{ConversationDriver, ScriptedDriver};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

fn load_env_file() {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine current directory for .env lookup");
            return;
        }
    };

    // Search the current directory and ancestors so running from `arena/`
    // still picks up a repo-root `.env`.
    let mut current = cwd.clone();
    loop {
        let candidate = current.join(".env");
        if candidate.exists() {
            match dotenvy::from_path(&candidate) {
                Ok(_) => {
                    tracing::info!(path = %candidate.display(), "Loaded environment from .env");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.display(),
                        error = %e,
                        "Failed to load .env file"
                    );
                }
            }
            return;
        }

        if !current.pop() {
            break;
        }
    }

    tracing::info!(
        cwd = %cwd.display(),
        "No .env file found in current directory or ancestors; using process environment only"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    load_env_file();
    let config = Config::from_env();

    tracing::info!("Starting Arena API Server");

    // The scripted driver stands in where a model-backed conversation
    // driver would plug into the seam.
    let driver: Arc<dyn ConversationDriver> = Arc::new(ScriptedDriver::demo());

    let app_state = AppState::spawn(config.clone(), driver)
        .await
        .map_err(|e| anyhow::anyhow!("failed to spawn actors: {e}"))?;

    // Observers may connect from anywhere; the API carries no credentials.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router()
        .with_state(api::ApiState { app_state })
        .layer(cors);

    tracing::info!(addr = %config.bind_addr, "Starting HTTP server");
    let listener = TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
