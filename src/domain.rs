//! Domain models: identifiers, task graphs (nodes + choices), attempts, and mistake records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(pub u64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }
  };
}

id_type!(TaskId);
id_type!(TopicId);
id_type!(ClassId);
id_type!(StudentId);
id_type!(AttemptId);
id_type!(
  /// Ledger ids are handed out in insertion order.
  MistakeId
);

/// Key of a node inside one task graph.
pub type NodeKey = String;

/// A topic groups tasks for browsing and per-topic analytics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Topic {
  pub id: TopicId,
  pub title: String,
  #[serde(default)] pub description: String,
}

/// One selectable answer option at a node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Choice {
  pub key: String,
  pub text: String,
  #[serde(default)] pub is_mistake: bool,
  /// Aggregation label; only meaningful on mistake choices.
  #[serde(default)] pub mistake_type: String,
  #[serde(default)] pub hint: String,
  /// `None` means there is no further node: a correct choice completes the task.
  #[serde(default)] pub next: Option<NodeKey>,
}

/// A prompt plus the choices offered at that point of the graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
  pub key: NodeKey,
  pub prompt: String,
  #[serde(default)] pub terminal: bool,
  #[serde(default)] pub choices: Vec<Choice>,
}

impl Node {
  /// Look up a choice offered by this node.
  pub fn choice(&self, key: &str) -> Option<&Choice> {
    self.choices.iter().find(|c| c.key == key)
  }
}

/// Immutable definition of a guided task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskGraph {
  pub id: TaskId,
  pub topic_id: TopicId,
  pub title: String,
  #[serde(default)] pub description: String,
  pub root: NodeKey,
  pub nodes: BTreeMap<NodeKey, Node>,
}

/// Short listing entry for a task.
#[derive(Clone, Debug, Serialize)]
pub struct TaskSummary {
  pub id: TaskId,
  pub title: String,
  pub description: String,
}

impl From<&TaskGraph> for TaskSummary {
  fn from(g: &TaskGraph) -> Self {
    Self { id: g.id, title: g.title.clone(), description: g.description.clone() }
  }
}

/// A topic with the tasks that belong to it.
#[derive(Clone, Debug, Serialize)]
pub struct TopicListing {
  pub topic: Topic,
  pub tasks: Vec<TaskSummary>,
}

/// One accepted submission, kept on the attempt itself.
#[derive(Clone, Debug, Serialize)]
pub struct AttemptStep {
  pub node_key: NodeKey,
  pub choice_key: String,
  pub is_correct: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mistake_type: Option<String>,
  pub at: DateTime<Utc>,
}

/// One student's traversal of a task graph within a class.
#[derive(Clone, Debug, Serialize)]
pub struct Attempt {
  pub id: AttemptId,
  pub task_id: TaskId,
  pub class_id: ClassId,
  pub student_id: StudentId,
  pub current_node: NodeKey,
  pub completed: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub steps: Vec<AttemptStep>,
}

/// Ledger entry for an incorrect choice. Class/student/task are copied in so
/// aggregation never has to join back to the attempt.
#[derive(Clone, Debug, Serialize)]
pub struct MistakeRecord {
  pub id: MistakeId,
  pub attempt_id: AttemptId,
  pub class_id: ClassId,
  pub student_id: StudentId,
  pub task_id: TaskId,
  pub node_key: NodeKey,
  pub choice_key: String,
  pub mistake_type: String,
  pub hint: String,
  pub created_at: DateTime<Utc>,
}

/// Outcome of one `submit_choice` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepResult {
  pub is_correct: bool,
  pub next_node: Option<NodeKey>,
  pub mistake_type: Option<String>,
  pub hint: Option<String>,
  pub completed: bool,
}

/// A class as seen by the roster.
#[derive(Clone, Debug, Serialize)]
pub struct Class {
  pub id: ClassId,
  pub name: String,
  pub invite_code: String,
}
