//! Application state: the engine plus effective settings.
//!
//! Startup loads built-in seed content first, then anything from the TOML
//! config. Config entries that collide with existing ids or fail validation
//! are skipped with an error log; they never abort startup.

use std::collections::BTreeMap;

use tracing::{error, info, instrument};

use crate::config::{load_config_from_env, AppConfig, Settings};
use crate::domain::{ClassId, StudentId, TaskGraph, TopicId};
use crate::engine::Engine;
use crate::seeds::{seed_class, seed_tasks, seed_topics};

pub struct AppState {
    pub engine: Engine,
    pub settings: Settings,
}

impl AppState {
    /// Build state from env: read config, then seed the engine.
    #[instrument(level = "info", skip_all)]
    pub async fn from_env() -> Self {
        let cfg = load_config_from_env().unwrap_or_default();
        let settings = Settings::resolve(&cfg.settings);
        Self::with_config(cfg, settings).await
    }

    pub async fn with_config(cfg: AppConfig, settings: Settings) -> Self {
        let engine = Engine::new(settings.storage_timeout);

        for topic in seed_topics().into_iter().chain(cfg.topics) {
            let id = topic.id;
            if let Err(e) = engine.register_topic(topic).await {
                error!(target: "mathmind_backend", topic = %id, error = %e, "Failed to register topic");
            }
        }

        let config_tasks = cfg.tasks.into_iter().filter_map(|task| {
            let id = task.id;
            match TaskGraph::try_from(task) {
                Ok(graph) => Some(graph),
                Err(e) => {
                    error!(target: "mathmind_backend", task = id, error = %e, "Skipping task graph");
                    None
                }
            }
        });
        let mut count_by_topic: BTreeMap<TopicId, usize> = BTreeMap::new();
        for graph in seed_tasks().into_iter().chain(config_tasks) {
            let (id, topic) = (graph.id, graph.topic_id);
            match engine.register_graph(graph).await {
                Ok(_) => *count_by_topic.entry(topic).or_default() += 1,
                Err(e) => {
                    error!(target: "mathmind_backend", task = %id, error = %e, "Skipping task graph");
                }
            }
        }
        for (topic, tasks) in count_by_topic {
            info!(target: "mathmind_backend", %topic, tasks, "Startup task inventory");
        }

        let (id, name, code, students) = seed_class();
        let seeded = std::iter::once((
            id,
            name.to_string(),
            Some(code.to_string()),
            students.into_iter().map(|(sid, n)| (sid, Some(n.to_string()))).collect::<Vec<_>>(),
        ));
        let configured = cfg.classes.into_iter().map(|c| {
            let students = c.students.into_iter().map(|s| (s.id, s.name)).collect::<Vec<_>>();
            (c.id, c.name, c.invite_code, students)
        });
        for (id, name, code, students) in seeded.chain(configured) {
            let class_id = ClassId(id);
            if let Err(e) = engine.add_class(class_id, &name, code.as_deref()).await {
                error!(target: "mathmind_backend", class = %class_id, error = %e, "Skipping class");
                continue;
            }
            for (sid, student_name) in students {
                if let Err(e) = engine.enroll(class_id, StudentId(sid), student_name.as_deref()).await {
                    error!(target: "mathmind_backend", class = %class_id, student = sid, error = %e, "Failed to enroll student");
                }
            }
            info!(target: "mathmind_backend", class = %class_id, %name, "Class ready");
        }

        Self { engine, settings }
    }
}
