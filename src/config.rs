//! Runtime settings (env) and optional TOML content: topics, task graphs, classes.
//!
//! See `AppConfig` for the expected schema. Env variables win over `[settings]`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{Node, TaskGraph, TaskId, Topic, TopicId};
use crate::error::EngineError;
use crate::ledger::{DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 2000;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub settings: SettingsCfg,
  #[serde(default)]
  pub topics: Vec<Topic>,
  #[serde(default)]
  pub tasks: Vec<TaskCfg>,
  #[serde(default)]
  pub classes: Vec<ClassCfg>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct SettingsCfg {
  #[serde(default)] pub storage_timeout_ms: Option<u64>,
  #[serde(default)] pub recent_limit: Option<usize>,
}

/// Task entry accepted in TOML. Nodes are listed; the map is keyed on load.
#[derive(Clone, Debug, Deserialize)]
pub struct TaskCfg {
  pub id: u64,
  pub topic_id: u64,
  pub title: String,
  #[serde(default)] pub description: String,
  pub root: String,
  #[serde(default)] pub nodes: Vec<Node>,
}

/// Keys the listed nodes. A key listed twice is rejected rather than letting
/// the later node shadow the earlier one.
impl TryFrom<TaskCfg> for TaskGraph {
  type Error = EngineError;

  fn try_from(t: TaskCfg) -> Result<Self, EngineError> {
    let mut nodes = BTreeMap::new();
    for node in t.nodes {
      let key = node.key.clone();
      if nodes.insert(key.clone(), node).is_some() {
        return Err(EngineError::InvalidState(format!("task {}: node '{}' is defined twice", t.id, key)));
      }
    }
    Ok(TaskGraph {
      id: TaskId(t.id),
      topic_id: TopicId(t.topic_id),
      title: t.title,
      description: t.description,
      root: t.root,
      nodes,
    })
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClassCfg {
  pub id: u64,
  pub name: String,
  #[serde(default)] pub invite_code: Option<String>,
  #[serde(default)] pub students: Vec<StudentCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StudentCfg {
  pub id: u64,
  #[serde(default)] pub name: Option<String>,
}

/// Effective process settings.
#[derive(Clone, Debug)]
pub struct Settings {
  pub port: u16,
  pub storage_timeout: Duration,
  pub recent_limit: usize,
}

impl Settings {
  /// Resolve settings from env with file values as fallback.
  pub fn resolve(file: &SettingsCfg) -> Self {
    Self::resolve_with(file, |k| std::env::var(k).ok())
  }

  pub(crate) fn resolve_with(file: &SettingsCfg, env: impl Fn(&str) -> Option<String>) -> Self {
    let port = env("PORT").and_then(|p| p.parse::<u16>().ok()).unwrap_or(DEFAULT_PORT);
    let timeout_ms = env("STORAGE_TIMEOUT_MS")
      .and_then(|v| v.parse::<u64>().ok())
      .or(file.storage_timeout_ms)
      .filter(|ms| *ms > 0)
      .unwrap_or(DEFAULT_STORAGE_TIMEOUT_MS);
    let recent_limit = env("RECENT_MISTAKES_LIMIT")
      .and_then(|v| v.parse::<usize>().ok())
      .or(file.recent_limit)
      .unwrap_or(DEFAULT_RECENT_LIMIT);
    if recent_limit > MAX_RECENT_LIMIT {
      warn!(target: "mathmind_backend", recent_limit, max = MAX_RECENT_LIMIT, "Recent mistakes limit capped");
    }
    Self {
      port,
      storage_timeout: Duration::from_millis(timeout_ms),
      recent_limit: recent_limit.min(MAX_RECENT_LIMIT),
    }
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from MATHMIND_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("MATHMIND_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "mathmind_backend", %path, topics = cfg.topics.len(), tasks = cfg.tasks.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "mathmind_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "mathmind_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
