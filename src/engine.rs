//! Engine facade: the contract consumed by the HTTP layer.
//!
//! Owns the graph registry, attempt store, mistake ledger and roster. Every
//! store access is bounded by the configured storage timeout.

use std::sync::Arc;
use std::time::Duration;

use crate::analytics::{self, MistakeCount, StudentMistakes, TopicMistakeCount};
use crate::attempts::AttemptStore;
use crate::domain::{
    Attempt, AttemptId, Class, ClassId, MistakeRecord, StepResult, StudentId, TaskGraph, TaskId, Topic,
    TopicListing,
};
use crate::error::Result;
use crate::graph::GraphRegistry;
use crate::ledger::MistakeLedger;
use crate::roster::Roster;

pub struct Engine {
    graphs: GraphRegistry,
    attempts: AttemptStore,
    ledger: MistakeLedger,
    roster: Roster,
}

impl Engine {
    pub fn new(storage_timeout: Duration) -> Self {
        Self {
            graphs: GraphRegistry::new(storage_timeout),
            attempts: AttemptStore::new(storage_timeout),
            ledger: MistakeLedger::new(storage_timeout),
            roster: Roster::new(storage_timeout),
        }
    }

    // --- task graphs ---

    pub async fn register_topic(&self, topic: Topic) -> Result<()> {
        self.graphs.register_topic(topic).await
    }

    pub async fn register_graph(&self, graph: TaskGraph) -> Result<Arc<TaskGraph>> {
        self.graphs.register_graph(graph).await
    }

    pub async fn load_graph(&self, task_id: TaskId) -> Result<Arc<TaskGraph>> {
        self.graphs.load_graph(task_id).await
    }

    pub async fn list_topics(&self) -> Result<Vec<TopicListing>> {
        self.graphs.list_topics().await
    }

    // --- attempts ---

    /// Idempotent: the same triple always yields the same attempt. The student
    /// is attached to the class roster before the attempt is created, so an
    /// error never leaves a fresh attempt behind; retrying is always safe.
    pub async fn get_or_create_attempt(
        &self,
        student_id: StudentId,
        class_id: ClassId,
        task_id: TaskId,
    ) -> Result<Attempt> {
        let graph = self.graphs.load_graph(task_id).await?;
        self.roster.attach(class_id, student_id, None).await?;
        self.attempts.get_or_create(student_id, class_id, &graph).await
    }

    pub async fn get_attempt(&self, attempt_id: AttemptId) -> Result<Attempt> {
        self.attempts.get(attempt_id).await
    }

    pub async fn submit_choice(&self, attempt_id: AttemptId, node_key: &str, choice_key: &str) -> Result<StepResult> {
        let task_id = self.attempts.get(attempt_id).await?.task_id;
        let graph = self.graphs.load_graph(task_id).await?;
        self.attempts
            .submit(attempt_id, &graph, &self.ledger, node_key, choice_key)
            .await
    }

    // --- roster ---

    pub async fn add_class(&self, id: ClassId, name: &str, invite_code: Option<&str>) -> Result<Class> {
        self.roster.add_class(id, name, invite_code).await
    }

    pub async fn create_class(&self, name: &str) -> Result<Class> {
        self.roster.create_class(name).await
    }

    pub async fn join_class(&self, invite_code: &str, student_id: StudentId, name: Option<&str>) -> Result<Class> {
        self.roster.join_class(invite_code, student_id, name).await
    }

    pub async fn enroll(&self, class_id: ClassId, student_id: StudentId, name: Option<&str>) -> Result<()> {
        self.roster.attach(class_id, student_id, name).await
    }

    pub async fn get_class(&self, class_id: ClassId) -> Result<Class> {
        self.roster.get_class(class_id).await
    }

    // --- analytics ---

    pub async fn recent_for_class(&self, class_id: ClassId, limit: usize) -> Result<Vec<MistakeRecord>> {
        self.ledger.recent_for_class(class_id, limit).await
    }

    pub async fn mistake_frequency_by_class(&self, class_id: ClassId) -> Result<Vec<MistakeCount>> {
        let records = self.ledger.for_class(class_id).await?;
        Ok(analytics::frequency(&records))
    }

    pub async fn mistake_frequency_by_topic(&self, class_id: ClassId) -> Result<Vec<TopicMistakeCount>> {
        let records = self.ledger.for_class(class_id).await?;
        let topics = self.graphs.topic_index().await?;
        analytics::frequency_by_topic(&records, &topics)
    }

    pub async fn student_mistake_breakdown(&self, class_id: ClassId) -> Result<Vec<StudentMistakes>> {
        let records = self.ledger.for_class(class_id).await?;
        let students = self.roster.students(class_id).await?;
        Ok(analytics::breakdown(&records, students))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, Resource};
    use crate::fixtures::{single_step_graph, three_step_graph, topic};

    async fn engine_with(graphs: Vec<TaskGraph>) -> Engine {
        let engine = Engine::new(Duration::from_secs(2));
        engine.register_topic(topic(1, "Percentages")).await.unwrap();
        for g in graphs {
            engine.register_graph(g).await.unwrap();
        }
        engine
    }

    #[tokio::test]
    async fn test_attempt_creation_is_idempotent() {
        let engine = engine_with(vec![three_step_graph(TaskId(1))]).await;
        let a = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap();
        let b = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.current_node, "root");
        assert_eq!(
            engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(9)).await.unwrap_err(),
            EngineError::NotFound(Resource::Task(TaskId(9)))
        );
    }

    #[tokio::test]
    async fn test_roster_timeout_creates_no_attempt() {
        let engine = Engine::new(Duration::from_millis(50));
        engine.register_topic(topic(1, "Percentages")).await.unwrap();
        engine.register_graph(three_step_graph(TaskId(1))).await.unwrap();

        let held = engine.roster.lock_inner().await;
        let err = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap_err();
        drop(held);
        assert_eq!(err, EngineError::StorageUnavailable("roster"));
        assert_eq!(
            engine.get_attempt(AttemptId(1)).await.unwrap_err(),
            EngineError::NotFound(Resource::Attempt(AttemptId(1)))
        );

        let a = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap();
        assert_eq!(a.id, AttemptId(1));
        assert_eq!(engine.student_mistake_breakdown(ClassId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_correct_choice_completes() {
        let engine = engine_with(vec![single_step_graph(TaskId(1))]).await;
        let a = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap();
        let r = engine.submit_choice(a.id, "root", "ok").await.unwrap();
        assert!(r.is_correct);
        assert!(r.completed);
        assert_eq!(r.next_node, None);
        assert!(engine.get_attempt(a.id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_mistake_then_two_correct_steps() {
        let engine = engine_with(vec![three_step_graph(TaskId(1))]).await;
        let a = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap();

        let r1 = engine.submit_choice(a.id, "root", "oops").await.unwrap();
        assert!(!r1.is_correct && !r1.completed);
        assert_eq!(r1.hint.as_deref(), Some("hint for oops"));
        let recent = engine.recent_for_class(ClassId(1), 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].attempt_id, a.id);
        assert_eq!(recent[0].student_id, StudentId(1));
        assert_eq!(recent[0].mistake_type, "sign error");

        let r2 = engine.submit_choice(a.id, "root", "ok").await.unwrap();
        assert!(r2.is_correct && !r2.completed);
        assert_eq!(engine.get_attempt(a.id).await.unwrap().current_node, "mid");

        let r3 = engine.submit_choice(a.id, "mid", "ok").await.unwrap();
        assert!(r3.completed);
        assert_eq!(r3.next_node.as_deref(), Some("end"));

        let done = engine.get_attempt(a.id).await.unwrap();
        assert!(done.completed);
        assert_eq!(done.steps.len(), 3);
        assert_eq!(engine.recent_for_class(ClassId(1), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_completed_attempt_rejects_further_choices() {
        let engine = engine_with(vec![single_step_graph(TaskId(1))]).await;
        let a = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap();
        engine.submit_choice(a.id, "root", "ok").await.unwrap();
        let before = engine.get_attempt(a.id).await.unwrap();

        for choice in ["ok", "slip"] {
            assert_eq!(
                engine.submit_choice(a.id, "root", choice).await.unwrap_err(),
                EngineError::AlreadyCompleted(a.id)
            );
        }
        let after = engine.get_attempt(a.id).await.unwrap();
        assert!(after.completed);
        assert_eq!(after.current_node, before.current_node);
        assert_eq!(after.steps.len(), before.steps.len());
        assert!(engine.recent_for_class(ClassId(1), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_submissions_apply_once() {
        let engine = Arc::new(engine_with(vec![single_step_graph(TaskId(1))]).await);
        let id = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap().id;
        let mut handles = Vec::new();
        for _ in 0..16 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move { engine.submit_choice(id, "root", "ok").await }));
        }
        let mut completed = 0;
        let mut rejected = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(r) if r.completed => completed += 1,
                Err(EngineError::AlreadyCompleted(_)) => rejected += 1,
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert_eq!((completed, rejected), (1, 15));
        assert_eq!(engine.get_attempt(id).await.unwrap().steps.len(), 1);
    }

    #[tokio::test]
    async fn test_analytics_over_class_activity() {
        let engine = engine_with(vec![three_step_graph(TaskId(1)), single_step_graph(TaskId(2))]).await;
        engine.enroll(ClassId(1), StudentId(3), Some("Quiet")).await.unwrap();

        let a = engine.get_or_create_attempt(StudentId(1), ClassId(1), TaskId(1)).await.unwrap();
        engine.submit_choice(a.id, "root", "oops").await.unwrap();
        engine.submit_choice(a.id, "root", "oops").await.unwrap();
        let b = engine.get_or_create_attempt(StudentId(2), ClassId(1), TaskId(2)).await.unwrap();
        engine.submit_choice(b.id, "root", "slip").await.unwrap();
        let other = engine.get_or_create_attempt(StudentId(2), ClassId(2), TaskId(2)).await.unwrap();
        engine.submit_choice(other.id, "root", "slip").await.unwrap();

        let freq = engine.mistake_frequency_by_class(ClassId(1)).await.unwrap();
        assert_eq!(
            freq,
            vec![
                MistakeCount { mistake_type: "sign error".into(), count: 2 },
                MistakeCount { mistake_type: "wrong base".into(), count: 1 },
            ]
        );

        let by_topic = engine.mistake_frequency_by_topic(ClassId(1)).await.unwrap();
        assert_eq!(by_topic.len(), 2);
        assert!(by_topic.iter().all(|r| r.topic_title == "Percentages"));

        let students = engine.student_mistake_breakdown(ClassId(1)).await.unwrap();
        let ids: Vec<_> = students.iter().map(|s| s.student_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(students[2].mistakes.is_empty());

        let recent = engine.recent_for_class(ClassId(1), 10).await.unwrap();
        assert_eq!(recent[0].mistake_type, "wrong base");
    }
}
