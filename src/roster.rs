//! Class roster: which students have ever been attached to a class.
//!
//! Identity and authentication live elsewhere; this only keeps the membership
//! facts that the per-student analytics need, plus invite codes for joining.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;

use crate::domain::{Class, ClassId, StudentId};
use crate::error::{bounded, EngineError, Resource, Result};

#[derive(Default)]
struct RosterInner {
    classes: BTreeMap<ClassId, Class>,
    members: BTreeMap<ClassId, BTreeSet<StudentId>>,
    names: HashMap<StudentId, String>,
}

impl RosterInner {
    fn fresh_invite_code(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let b: [u8; 3] = rng.gen();
            let code = format!("CLS-{:02X}{:02X}{:02X}", b[0], b[1], b[2]);
            if !self.classes.values().any(|c| c.invite_code == code) {
                return code;
            }
        }
    }

    fn attach(&mut self, class_id: ClassId, student_id: StudentId, name: Option<&str>) {
        self.members.entry(class_id).or_default().insert(student_id);
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            self.names.insert(student_id, name.trim().to_string());
        }
    }
}

pub struct Roster {
    inner: RwLock<RosterInner>,
    timeout: Duration,
}

impl Roster {
    pub fn new(timeout: Duration) -> Self {
        Self { inner: RwLock::new(RosterInner::default()), timeout }
    }

    /// Register a class with a known id (seed/config content). A missing
    /// invite code gets a generated one. Existing ids are never replaced.
    pub async fn add_class(&self, id: ClassId, name: &str, invite_code: Option<&str>) -> Result<Class> {
        let mut inner = bounded(self.timeout, "roster", self.inner.write()).await?;
        if inner.classes.contains_key(&id) {
            return Err(EngineError::InvalidState(format!("class {} is already registered", id)));
        }
        let invite_code = match invite_code {
            Some(code) => code.trim().to_uppercase(),
            None => inner.fresh_invite_code(),
        };
        if inner.classes.values().any(|c| c.id != id && c.invite_code == invite_code) {
            return Err(EngineError::InvalidState(format!("invite code {} is already in use", invite_code)));
        }
        let class = Class { id, name: name.to_string(), invite_code };
        inner.classes.insert(id, class.clone());
        Ok(class)
    }

    /// Create a class with the next free id and a fresh invite code.
    pub async fn create_class(&self, name: &str) -> Result<Class> {
        let mut inner = bounded(self.timeout, "roster", self.inner.write()).await?;
        let next = inner.classes.keys().next_back().map_or(1, |id| id.0 + 1);
        let class = Class {
            id: ClassId(next),
            name: name.trim().to_string(),
            invite_code: inner.fresh_invite_code(),
        };
        inner.classes.insert(class.id, class.clone());
        Ok(class)
    }

    /// Join a class by invite code (case-insensitive). Joining twice is harmless.
    pub async fn join_class(&self, invite_code: &str, student_id: StudentId, name: Option<&str>) -> Result<Class> {
        let wanted = invite_code.trim().to_uppercase();
        let mut inner = bounded(self.timeout, "roster", self.inner.write()).await?;
        let class = inner
            .classes
            .values()
            .find(|c| c.invite_code == wanted)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(Resource::InviteCode(invite_code.trim().to_string())))?;
        inner.attach(class.id, student_id, name);
        Ok(class)
    }

    /// Record that a student belongs to a class. The class does not need to be
    /// known to the roster; membership can come from the identity layer.
    pub async fn attach(&self, class_id: ClassId, student_id: StudentId, name: Option<&str>) -> Result<()> {
        let mut inner = bounded(self.timeout, "roster", self.inner.write()).await?;
        inner.attach(class_id, student_id, name);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn lock_inner(&self) -> impl Sized + '_ {
        self.inner.write().await
    }

    pub async fn get_class(&self, class_id: ClassId) -> Result<Class> {
        let inner = bounded(self.timeout, "roster", self.inner.read()).await?;
        inner
            .classes
            .get(&class_id)
            .cloned()
            .ok_or(EngineError::NotFound(Resource::Class(class_id)))
    }

    /// Students ever attached to the class, ascending by id, with display names when known.
    pub async fn students(&self, class_id: ClassId) -> Result<Vec<(StudentId, Option<String>)>> {
        let inner = bounded(self.timeout, "roster", self.inner.read()).await?;
        Ok(inner
            .members
            .get(&class_id)
            .map(|set| set.iter().map(|id| (*id, inner.names.get(id).cloned())).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_join_by_code() {
        let roster = Roster::new(Duration::from_secs(1));
        let class = roster.create_class("7A").await.unwrap();
        assert!(class.invite_code.starts_with("CLS-"));
        assert_eq!(class.invite_code.len(), 10);

        let joined = roster
            .join_class(&class.invite_code.to_lowercase(), StudentId(4), Some("Masha"))
            .await
            .unwrap();
        assert_eq!(joined.id, class.id);
        roster.join_class(&class.invite_code, StudentId(4), None).await.unwrap();

        let students = roster.students(class.id).await.unwrap();
        assert_eq!(students, vec![(StudentId(4), Some("Masha".to_string()))]);
    }

    #[tokio::test]
    async fn test_unknown_code_and_ordering() {
        let roster = Roster::new(Duration::from_secs(1));
        let err = roster.join_class("NOPE", StudentId(1), None).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(Resource::InviteCode(_))));

        roster.attach(ClassId(3), StudentId(9), None).await.unwrap();
        roster.attach(ClassId(3), StudentId(2), Some("Ivan")).await.unwrap();
        let ids: Vec<_> = roster.students(ClassId(3)).await.unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![StudentId(2), StudentId(9)]);
        assert!(roster.students(ClassId(4)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_class_rejects_code_reuse() {
        let roster = Roster::new(Duration::from_secs(1));
        roster.add_class(ClassId(1), "7A", Some("start-7a")).await.unwrap();
        assert_eq!(roster.get_class(ClassId(1)).await.unwrap().invite_code, "START-7A");
        assert!(roster.add_class(ClassId(2), "7B", Some("START-7A")).await.is_err());
        let next = roster.create_class("8A").await.unwrap();
        assert_eq!(next.id, ClassId(2));
    }

    #[tokio::test]
    async fn test_add_class_rejects_existing_id() {
        let roster = Roster::new(Duration::from_secs(1));
        roster.add_class(ClassId(1), "7A", Some("START-7A")).await.unwrap();
        let err = roster.add_class(ClassId(1), "Impostor", Some("OTHER")).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));

        let kept = roster.get_class(ClassId(1)).await.unwrap();
        assert_eq!((kept.name.as_str(), kept.invite_code.as_str()), ("7A", "START-7A"));
        assert!(roster.join_class("OTHER", StudentId(1), None).await.is_err());
    }
}
