//! Attempt state machine.
//!
//! An attempt is either in progress at some node or completed. Completion is
//! reached only by a correct choice that either has no next node or leads to a
//! terminal node; mistakes never complete. Each attempt sits behind its own
//! mutex so submissions for one attempt are applied one at a time without
//! serializing unrelated students.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    Attempt, AttemptId, AttemptStep, ClassId, NodeKey, StepResult, StudentId, TaskGraph, TaskId,
};
use crate::error::{bounded, EngineError, Resource, Result};
use crate::graph::{get_choice, get_node};
use crate::ledger::{MistakeLedger, NewMistake};

type Triple = (StudentId, ClassId, TaskId);

/// What a valid submission will do to an attempt, computed before anything is written.
#[derive(Debug)]
pub(crate) struct Planned {
    pub result: StepResult,
    pub cursor: NodeKey,
    pub mistake: Option<NewMistake>,
}

/// Decide the outcome of choosing `choice_key` at `node_key` without mutating anything.
pub(crate) fn plan(graph: &TaskGraph, attempt: &Attempt, node_key: &str, choice_key: &str) -> Result<Planned> {
    if attempt.completed {
        return Err(EngineError::AlreadyCompleted(attempt.id));
    }
    if node_key != attempt.current_node {
        return Err(EngineError::StaleNode {
            current: attempt.current_node.clone(),
            submitted: node_key.to_string(),
        });
    }
    let node = get_node(graph, &attempt.current_node)?;
    let choice = get_choice(node, choice_key)?;

    if choice.is_mistake {
        // No next node on a mistake means "ask the same question again".
        let cursor = choice.next.clone().unwrap_or_else(|| attempt.current_node.clone());
        return Ok(Planned {
            result: StepResult {
                is_correct: false,
                next_node: Some(cursor.clone()),
                mistake_type: Some(choice.mistake_type.clone()),
                hint: Some(choice.hint.clone()),
                completed: false,
            },
            cursor,
            mistake: Some(NewMistake {
                attempt_id: attempt.id,
                class_id: attempt.class_id,
                student_id: attempt.student_id,
                task_id: attempt.task_id,
                node_key: node.key.clone(),
                choice_key: choice.key.clone(),
                mistake_type: choice.mistake_type.clone(),
                hint: choice.hint.clone(),
            }),
        });
    }

    let correct = |next_node: Option<NodeKey>, completed: bool| StepResult {
        is_correct: true,
        next_node,
        mistake_type: None,
        hint: None,
        completed,
    };

    match &choice.next {
        None => Ok(Planned {
            result: correct(None, true),
            cursor: attempt.current_node.clone(),
            mistake: None,
        }),
        Some(next) => {
            let next_node = get_node(graph, next)?;
            if next_node.terminal {
                // The cursor stays where the final answer was given.
                Ok(Planned {
                    result: correct(Some(next.clone()), true),
                    cursor: attempt.current_node.clone(),
                    mistake: None,
                })
            } else {
                Ok(Planned {
                    result: correct(Some(next.clone()), false),
                    cursor: next.clone(),
                    mistake: None,
                })
            }
        }
    }
}

pub struct AttemptStore {
    by_triple: Mutex<HashMap<Triple, AttemptId>>,
    by_id: RwLock<HashMap<AttemptId, Arc<Mutex<Attempt>>>>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl AttemptStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            by_triple: Mutex::new(HashMap::new()),
            by_id: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            timeout,
        }
    }

    /// Return the attempt for the triple, creating it at the graph root on first use.
    /// The triple index lock is held across check-then-insert, so concurrent
    /// first requests agree on a single attempt.
    pub async fn get_or_create(
        &self,
        student_id: StudentId,
        class_id: ClassId,
        graph: &TaskGraph,
    ) -> Result<Attempt> {
        let triple = (student_id, class_id, graph.id);
        let mut index = bounded(self.timeout, "attempt index", self.by_triple.lock()).await?;
        if let Some(id) = index.get(&triple).copied() {
            drop(index);
            return self.get(id).await;
        }

        let now = Utc::now();
        let attempt = Attempt {
            id: AttemptId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            task_id: graph.id,
            class_id,
            student_id,
            current_node: graph.root.clone(),
            completed: false,
            created_at: now,
            updated_at: now,
            steps: Vec::new(),
        };
        let mut by_id = bounded(self.timeout, "attempts", self.by_id.write()).await?;
        by_id.insert(attempt.id, Arc::new(Mutex::new(attempt.clone())));
        index.insert(triple, attempt.id);
        Ok(attempt)
    }

    /// Snapshot of an attempt.
    pub async fn get(&self, id: AttemptId) -> Result<Attempt> {
        let handle = self.handle(id).await?;
        let attempt = bounded(self.timeout, "attempt", handle.lock()).await?;
        Ok(attempt.clone())
    }

    /// Apply one submission. The attempt stays locked for the whole call; the
    /// ledger append happens before the cursor moves, so a failed append
    /// leaves the attempt untouched.
    pub async fn submit(
        &self,
        id: AttemptId,
        graph: &TaskGraph,
        ledger: &MistakeLedger,
        node_key: &str,
        choice_key: &str,
    ) -> Result<StepResult> {
        let handle = self.handle(id).await?;
        let mut attempt = bounded(self.timeout, "attempt", handle.lock()).await?;
        if attempt.task_id != graph.id {
            return Err(EngineError::InvalidState(format!(
                "attempt {} belongs to task {}, not {}",
                id, attempt.task_id, graph.id
            )));
        }

        let planned = plan(graph, &attempt, node_key, choice_key)?;
        if let Some(mistake) = planned.mistake {
            ledger.append(mistake).await?;
        }

        let now = Utc::now();
        let step = AttemptStep {
            node_key: attempt.current_node.clone(),
            choice_key: choice_key.to_string(),
            is_correct: planned.result.is_correct,
            mistake_type: planned.result.mistake_type.clone(),
            at: now,
        };
        attempt.steps.push(step);
        attempt.current_node = planned.cursor;
        attempt.completed = planned.result.completed;
        attempt.updated_at = now;
        Ok(planned.result)
    }

    async fn handle(&self, id: AttemptId) -> Result<Arc<Mutex<Attempt>>> {
        let by_id = bounded(self.timeout, "attempts", self.by_id.read()).await?;
        by_id
            .get(&id)
            .cloned()
            .ok_or(EngineError::NotFound(Resource::Attempt(id)))
    }
}
