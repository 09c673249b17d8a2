//! Append-only ledger of mistake records.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{AttemptId, ClassId, MistakeId, MistakeRecord, NodeKey, StudentId, TaskId};
use crate::error::{bounded, Result};

/// Default size of the recent-mistakes feed.
pub const DEFAULT_RECENT_LIMIT: usize = 10;
/// Upper bound on any recent-mistakes request.
pub const MAX_RECENT_LIMIT: usize = 15;

/// Everything about a mistake except the ledger-assigned id and timestamp.
#[derive(Clone, Debug)]
pub struct NewMistake {
    pub attempt_id: AttemptId,
    pub class_id: ClassId,
    pub student_id: StudentId,
    pub task_id: TaskId,
    pub node_key: NodeKey,
    pub choice_key: String,
    pub mistake_type: String,
    pub hint: String,
}

pub struct MistakeLedger {
    records: RwLock<Vec<MistakeRecord>>,
    timeout: Duration,
}

impl MistakeLedger {
    pub fn new(timeout: Duration) -> Self {
        Self { records: RwLock::new(Vec::new()), timeout }
    }

    /// Append one record. Ids and timestamps are assigned under the write lock,
    /// so insertion order and id order agree.
    pub async fn append(&self, m: NewMistake) -> Result<MistakeRecord> {
        let mut records = bounded(self.timeout, "mistake ledger", self.records.write()).await?;
        // Wall clock may step backwards; recency must not.
        let now = Utc::now();
        let created_at = records.last().map_or(now, |last| last.created_at.max(now));
        let record = MistakeRecord {
            id: MistakeId(records.len() as u64 + 1),
            attempt_id: m.attempt_id,
            class_id: m.class_id,
            student_id: m.student_id,
            task_id: m.task_id,
            node_key: m.node_key,
            choice_key: m.choice_key,
            mistake_type: m.mistake_type,
            hint: m.hint,
            created_at,
        };
        records.push(record.clone());
        Ok(record)
    }

    /// Most recent records for a class, newest first. Equal timestamps are
    /// ordered by insertion, later insert first.
    pub async fn recent_for_class(&self, class_id: ClassId, limit: usize) -> Result<Vec<MistakeRecord>> {
        let limit = limit.min(MAX_RECENT_LIMIT);
        let mut out = self.for_class(class_id).await?;
        out.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        out.truncate(limit);
        Ok(out)
    }

    #[cfg(test)]
    pub(crate) async fn lock_records(&self) -> tokio::sync::RwLockWriteGuard<'_, Vec<MistakeRecord>> {
        self.records.write().await
    }

    /// Snapshot of every record for a class in insertion order.
    pub(crate) async fn for_class(&self, class_id: ClassId) -> Result<Vec<MistakeRecord>> {
        let records = bounded(self.timeout, "mistake ledger", self.records.read()).await?;
        Ok(records.iter().filter(|r| r.class_id == class_id).cloned().collect())
    }
}
