//! MathMind · guided-task engine and backend.
//!
//! Students walk a branching graph of prompts and answer choices; mistake
//! choices are logged to an append-only ledger that teachers read back as
//! per-class statistics. `engine::Engine` is the entry point; `routes` wraps
//! it in an axum router.

pub mod analytics;
pub mod assistant;
pub mod attempts;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ledger;
pub mod protocol;
pub mod roster;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod telemetry;
pub mod util;

#[cfg(test)]
pub(crate) mod fixtures;

pub use engine::Engine;
pub use error::{EngineError, Result};
