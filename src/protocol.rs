//! Public protocol structs for the HTTP endpoints (serde ready).
//! Domain types already serialize; these cover request bodies and wrappers.

use serde::{Deserialize, Serialize};

use crate::domain::{ClassId, MistakeRecord, StudentId, TaskId, TopicListing};

#[derive(Debug, Deserialize)]
pub struct AttemptIn {
    pub student_id: StudentId,
    pub class_id: ClassId,
    pub task_id: TaskId,
}

#[derive(Debug, Deserialize)]
pub struct StepIn {
    pub node_key: String,
    pub choice_key: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateClassIn {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinClassIn {
    pub invite_code: String,
    pub student_id: StudentId,
    #[serde(default)]
    pub student_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantIn {
    pub goal: String,
    #[serde(default)]
    pub topic: String,
}

#[derive(Serialize)]
pub struct AssistantOut {
    pub goal: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct TopicsOut {
    pub topics: Vec<TopicListing>,
}

#[derive(Serialize)]
pub struct RecentOut {
    pub class_id: ClassId,
    pub mistakes: Vec<MistakeRecord>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
    pub kind: &'static str,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
