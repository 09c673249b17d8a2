//! Typed errors returned by the engine. The engine never logs; callers decide
//! how each kind is surfaced.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::domain::{AttemptId, ClassId, NodeKey, TaskId};

/// Something a caller referenced that does not exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    Task(TaskId),
    Attempt(AttemptId),
    Class(ClassId),
    InviteCode(String),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Task(id) => write!(f, "task {}", id),
            Resource::Attempt(id) => write!(f, "attempt {}", id),
            Resource::Class(id) => write!(f, "class {}", id),
            Resource::InviteCode(code) => write!(f, "invite code {}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("choice '{choice}' is not offered at node '{node}'")]
    ChoiceNotFound { node: NodeKey, choice: String },

    #[error("submitted against node '{submitted}' but the attempt is at '{current}'")]
    StaleNode { current: NodeKey, submitted: NodeKey },

    #[error("attempt {0} is already completed")]
    AlreadyCompleted(AttemptId),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(&'static str),
}

impl EngineError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::ChoiceNotFound { .. } => "choice_not_found",
            EngineError::StaleNode { .. } => "stale_node",
            EngineError::AlreadyCompleted(_) => "already_completed",
            EngineError::InvalidState(_) => "invalid_state",
            EngineError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Run a storage access under the caller's deadline. Elapsed deadlines become
/// `StorageUnavailable`; nothing is retried here.
pub(crate) async fn bounded<F: Future>(limit: Duration, what: &'static str, fut: F) -> Result<F::Output> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| EngineError::StorageUnavailable(what))
}
