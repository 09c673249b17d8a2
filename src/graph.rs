//! Task graph registry: registration-time validation and read-only lookups.
//!
//! Graphs are checked once when registered. Traversal afterwards assumes a
//! well-formed graph, so a failing node lookup means the data drifted and is
//! reported as `InvalidState` rather than as a user error.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::{Choice, Node, TaskGraph, TaskId, TaskSummary, Topic, TopicId, TopicListing};
use crate::error::{bounded, EngineError, Resource, Result};

/// Resolve a node key inside a graph.
pub fn get_node<'g>(graph: &'g TaskGraph, key: &str) -> Result<&'g Node> {
    graph.nodes.get(key).ok_or_else(|| {
        EngineError::InvalidState(format!("task {} has no node '{}'", graph.id, key))
    })
}

/// Resolve a submitted choice key at a node.
pub fn get_choice<'n>(node: &'n Node, key: &str) -> Result<&'n Choice> {
    node.choice(key).ok_or_else(|| EngineError::ChoiceNotFound {
        node: node.key.clone(),
        choice: key.to_string(),
    })
}

/// Check structural invariants of a graph before it is accepted.
pub fn validate(graph: &TaskGraph) -> Result<()> {
    let invalid = |msg: String| EngineError::InvalidState(format!("task {}: {}", graph.id, msg));

    if !graph.nodes.contains_key(&graph.root) {
        return Err(invalid(format!("root node '{}' does not exist", graph.root)));
    }

    for (key, node) in &graph.nodes {
        if key.is_empty() {
            return Err(invalid("node keys must be non-empty".into()));
        }
        if &node.key != key {
            return Err(invalid(format!("node '{}' is stored under key '{}'", node.key, key)));
        }
        let mut seen = HashSet::new();
        for choice in &node.choices {
            if choice.key.is_empty() {
                return Err(invalid(format!("node '{}' has a choice with an empty key", key)));
            }
            if !seen.insert(choice.key.as_str()) {
                return Err(invalid(format!("node '{}' repeats choice '{}'", key, choice.key)));
            }
            if choice.is_mistake && choice.mistake_type.trim().is_empty() {
                return Err(invalid(format!(
                    "mistake choice '{}' at node '{}' has no mistake type",
                    choice.key, key
                )));
            }
            if let Some(next) = &choice.next {
                if !graph.nodes.contains_key(next) {
                    return Err(invalid(format!(
                        "choice '{}' at node '{}' points to missing node '{}'",
                        choice.key, key, next
                    )));
                }
            }
        }
    }

    if !has_reachable_completion(graph) {
        return Err(invalid("no correct choice reachable from root completes the task".into()));
    }
    Ok(())
}

/// Breadth-first walk from the root over every declared edge, mistakes
/// included since they move the cursor too. Only a correct choice can finish
/// an attempt: one with no `next`, or one leading into a terminal node.
fn has_reachable_completion(graph: &TaskGraph) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([graph.root.as_str()]);
    while let Some(key) = queue.pop_front() {
        if !visited.insert(key) {
            continue;
        }
        let Some(node) = graph.nodes.get(key) else { continue };
        for choice in &node.choices {
            let completes = match &choice.next {
                None => !choice.is_mistake,
                Some(next) => !choice.is_mistake && graph.nodes.get(next).is_some_and(|n| n.terminal),
            };
            if completes {
                return true;
            }
            if let Some(next) = &choice.next {
                queue.push_back(next.as_str());
            }
        }
    }
    false
}

/// Topics and task graphs registered for the life of the process.
pub struct GraphRegistry {
    topics: RwLock<BTreeMap<TopicId, Topic>>,
    graphs: RwLock<HashMap<TaskId, Arc<TaskGraph>>>,
    timeout: Duration,
}

impl GraphRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            topics: RwLock::new(BTreeMap::new()),
            graphs: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Add a topic. Topic ids are registered once, like task ids.
    pub async fn register_topic(&self, topic: Topic) -> Result<()> {
        let mut topics = bounded(self.timeout, "topics", self.topics.write()).await?;
        if topics.contains_key(&topic.id) {
            return Err(EngineError::InvalidState(format!("topic {} is already registered", topic.id)));
        }
        topics.insert(topic.id, topic);
        Ok(())
    }

    /// Validate and register a graph. Registered graphs are never replaced.
    pub async fn register_graph(&self, graph: TaskGraph) -> Result<Arc<TaskGraph>> {
        validate(&graph)?;
        {
            let topics = bounded(self.timeout, "topics", self.topics.read()).await?;
            if !topics.contains_key(&graph.topic_id) {
                return Err(EngineError::InvalidState(format!(
                    "task {} belongs to unknown topic {}",
                    graph.id, graph.topic_id
                )));
            }
        }
        let mut graphs = bounded(self.timeout, "graphs", self.graphs.write()).await?;
        if graphs.contains_key(&graph.id) {
            return Err(EngineError::InvalidState(format!("task {} is already registered", graph.id)));
        }
        let graph = Arc::new(graph);
        graphs.insert(graph.id, graph.clone());
        Ok(graph)
    }

    /// Pure lookup of a registered graph.
    pub async fn load_graph(&self, task_id: TaskId) -> Result<Arc<TaskGraph>> {
        let graphs = bounded(self.timeout, "graphs", self.graphs.read()).await?;
        graphs
            .get(&task_id)
            .cloned()
            .ok_or(EngineError::NotFound(Resource::Task(task_id)))
    }

    /// Topics ascending by id, each with its tasks ascending by id.
    pub async fn list_topics(&self) -> Result<Vec<TopicListing>> {
        let topics = bounded(self.timeout, "topics", self.topics.read()).await?.clone();
        let graphs = bounded(self.timeout, "graphs", self.graphs.read()).await?;
        let mut by_topic: BTreeMap<TopicId, Vec<&TaskGraph>> = BTreeMap::new();
        for g in graphs.values() {
            by_topic.entry(g.topic_id).or_default().push(g);
        }
        Ok(topics
            .into_values()
            .map(|topic| {
                let mut tasks = by_topic.remove(&topic.id).unwrap_or_default();
                tasks.sort_by_key(|g| g.id);
                TopicListing {
                    tasks: tasks.into_iter().map(TaskSummary::from).collect(),
                    topic,
                }
            })
            .collect())
    }

    /// Snapshot of the task -> topic mapping with topic titles, used by analytics.
    pub(crate) async fn topic_index(&self) -> Result<HashMap<TaskId, (TopicId, String)>> {
        let topics = bounded(self.timeout, "topics", self.topics.read()).await?;
        let graphs = bounded(self.timeout, "graphs", self.graphs.read()).await?;
        Ok(graphs
            .values()
            .map(|g| {
                let title = topics.get(&g.topic_id).map(|t| t.title.clone()).unwrap_or_default();
                (g.id, (g.topic_id, title))
            })
            .collect())
    }
}
