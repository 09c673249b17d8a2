//! Read-side aggregation over the mistake ledger, recomputed on every call.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::domain::{MistakeRecord, StudentId, TaskId, TopicId};
use crate::error::{EngineError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MistakeCount {
    pub mistake_type: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TopicMistakeCount {
    pub topic_id: TopicId,
    pub topic_title: String,
    pub mistake_type: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StudentMistakes {
    pub student_id: StudentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub mistakes: BTreeMap<String, u64>,
}

/// Count desc, then mistake type ascending.
fn by_count_then_type(a: &(String, u64), b: &(String, u64)) -> std::cmp::Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Mistake frequency for one class's records.
pub fn frequency(records: &[MistakeRecord]) -> Vec<MistakeCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for r in records {
        *counts.entry(r.mistake_type.as_str()).or_default() += 1;
    }
    let mut rows: Vec<(String, u64)> = counts.into_iter().map(|(t, c)| (t.to_string(), c)).collect();
    rows.sort_by(by_count_then_type);
    rows.into_iter()
        .map(|(mistake_type, count)| MistakeCount { mistake_type, count })
        .collect()
}

/// Mistake frequency grouped by the topic owning each record's task,
/// ascending by topic id.
pub fn frequency_by_topic(
    records: &[MistakeRecord],
    topics: &HashMap<TaskId, (TopicId, String)>,
) -> Result<Vec<TopicMistakeCount>> {
    let mut grouped: BTreeMap<TopicId, (String, HashMap<&str, u64>)> = BTreeMap::new();
    for r in records {
        let (topic_id, title) = topics.get(&r.task_id).ok_or_else(|| {
            EngineError::InvalidState(format!("mistake {} references unregistered task {}", r.id, r.task_id))
        })?;
        let entry = grouped.entry(*topic_id).or_insert_with(|| (title.clone(), HashMap::new()));
        *entry.1.entry(r.mistake_type.as_str()).or_default() += 1;
    }

    let mut out = Vec::new();
    for (topic_id, (topic_title, counts)) in grouped {
        let mut rows: Vec<(String, u64)> = counts.into_iter().map(|(t, c)| (t.to_string(), c)).collect();
        rows.sort_by(by_count_then_type);
        out.extend(rows.into_iter().map(|(mistake_type, count)| TopicMistakeCount {
            topic_id,
            topic_title: topic_title.clone(),
            mistake_type,
            count,
        }));
    }
    Ok(out)
}

/// Per-student mistake counts. Every known student appears, with an empty
/// map when they have made no mistakes; output is ascending by student id.
pub fn breakdown(records: &[MistakeRecord], students: Vec<(StudentId, Option<String>)>) -> Vec<StudentMistakes> {
    let mut rows: BTreeMap<StudentId, StudentMistakes> = students
        .into_iter()
        .map(|(student_id, name)| (student_id, StudentMistakes { student_id, name, mistakes: BTreeMap::new() }))
        .collect();
    for r in records {
        let row = rows.entry(r.student_id).or_insert_with(|| StudentMistakes {
            student_id: r.student_id,
            name: None,
            mistakes: BTreeMap::new(),
        });
        *row.mistakes.entry(r.mistake_type.clone()).or_default() += 1;
    }
    rows.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttemptId, ClassId, MistakeId};
    use chrono::Utc;

    fn record(id: u64, student: u64, task: u64, ty: &str) -> MistakeRecord {
        MistakeRecord {
            id: MistakeId(id),
            attempt_id: AttemptId(student),
            class_id: ClassId(1),
            student_id: StudentId(student),
            task_id: TaskId(task),
            node_key: "root".into(),
            choice_key: "x".into(),
            mistake_type: ty.into(),
            hint: String::new(),
            created_at: Utc::now(),
        }
    }

    fn counts(rows: &[MistakeCount]) -> Vec<(&str, u64)> {
        rows.iter().map(|r| (r.mistake_type.as_str(), r.count)).collect()
    }

    #[test]
    fn test_frequency_sorted_by_count() {
        let mut records = Vec::new();
        let mut id = 0;
        for (ty, n) in [("A", 3), ("B", 5), ("C", 1)] {
            for _ in 0..n {
                id += 1;
                records.push(record(id, 1, 1, ty));
            }
        }
        assert_eq!(counts(&frequency(&records)), vec![("B", 5), ("A", 3), ("C", 1)]);
    }

    #[test]
    fn test_frequency_ties_break_lexically() {
        let records = vec![record(1, 1, 1, "zeta"), record(2, 1, 1, "alpha"), record(3, 1, 1, "mu")];
        assert_eq!(counts(&frequency(&records)), vec![("alpha", 1), ("mu", 1), ("zeta", 1)]);
        assert!(frequency(&[]).is_empty());
    }

    #[test]
    fn test_frequency_by_topic_groups_and_orders() {
        let topics = HashMap::from([
            (TaskId(1), (TopicId(2), "Equations".to_string())),
            (TaskId(2), (TopicId(1), "Percentages".to_string())),
            (TaskId(3), (TopicId(1), "Percentages".to_string())),
        ]);
        let records = vec![
            record(1, 1, 1, "sign"),
            record(2, 1, 2, "base"),
            record(3, 2, 3, "base"),
            record(4, 2, 3, "scale"),
        ];
        let rows = frequency_by_topic(&records, &topics).unwrap();
        let flat: Vec<_> = rows.iter().map(|r| (r.topic_id.0, r.mistake_type.as_str(), r.count)).collect();
        assert_eq!(flat, vec![(1, "base", 2), (1, "scale", 1), (2, "sign", 1)]);
        assert_eq!(rows[0].topic_title, "Percentages");

        let missing = frequency_by_topic(&[record(9, 1, 99, "x")], &topics);
        assert!(matches!(missing, Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn test_breakdown_includes_students_without_mistakes() {
        let records = vec![record(1, 2, 1, "A"), record(2, 2, 1, "A"), record(3, 7, 1, "B")];
        let rows = breakdown(&records, vec![(StudentId(5), Some("Olya".into())), (StudentId(2), None)]);
        let ids: Vec<_> = rows.iter().map(|r| r.student_id.0).collect();
        assert_eq!(ids, vec![2, 5, 7]);
        assert_eq!(rows[0].mistakes.get("A"), Some(&2));
        assert!(rows[1].mistakes.is_empty());
        assert_eq!(rows[1].name.as_deref(), Some("Olya"));
    }
}
