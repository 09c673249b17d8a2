//! MathMind · guided problem-solving backend
//!
//! - Axum HTTP API over the guided-task engine
//! - Built-in seed tasks, optional TOML content
//!
//! Important env variables:
//!   PORT                  : u16 (default 8080)
//!   MATHMIND_CONFIG_PATH  : path to TOML config (topics, tasks, classes, settings)
//!   STORAGE_TIMEOUT_MS    : bound on every store access (default 2000)
//!   RECENT_MISTAKES_LIMIT : size of the recent-mistakes feed (default 10, max 15)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use mathmind_backend::routes::build_router;
use mathmind_backend::state::AppState;
use mathmind_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Engine with seed + configured content.
  let state = Arc::new(AppState::from_env().await);
  let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));

  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "mathmind_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "mathmind_backend", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
