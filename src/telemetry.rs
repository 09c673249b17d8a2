//! Tracing setup for the mathmind backend.
//!
//! Log targets used by this service:
//! - `mathmind_backend`: startup inventory, skipped seed/config entries,
//!   class lifecycle and error-status responses (500 logs at error, 503 at warn).
//! - `attempt`: attempt creation and every applied step (correct, completed).
//! - `analytics`: per-class frequency and breakdown computations.
//! - `tower_http`: per-request spans from the router's TraceLayer.
//!
//! The engine types log nothing; callers log around them.
//!
//! LOG_LEVEL overrides the default filter
//! ("info,attempt=debug,analytics=info,mathmind_backend=debug,tower_http=info").
//! LOG_FORMAT=json switches from the pretty formatter to JSON lines.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    // Build a single fmt subscriber builder and attach the EnvFilter directly.
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
        EnvFilter::new("info,attempt=debug,analytics=info,mathmind_backend=debug,tower_http=info")
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Choose JSON vs pretty; don't try to store different layer types.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
