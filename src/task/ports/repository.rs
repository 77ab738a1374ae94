//! Repository port for task persistence and per-chat numbering.

use crate::task::domain::{ChatId, Comment, StatusFilter, Task, TaskId, TaskNumber};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Every task is an independently addressable record. Writes to one record
/// are serialized through its revision: a write based on a stale copy fails
/// with [`TaskRepositoryError::Conflict`] instead of overwriting newer data.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Atomically increments the chat's counter and returns the new value.
    ///
    /// The first call for a chat returns 1. Concurrent callers for the same
    /// chat never receive the same number.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the counter cannot
    /// be advanced. A failed increment never yields a number.
    async fn next_task_number(&self, chat_id: ChatId) -> TaskRepositoryResult<TaskNumber>;

    /// Inserts or replaces a task and returns the stored copy.
    ///
    /// A task at revision 0 has never been stored and is inserted at
    /// revision 1. Any other task is replaced only when its revision matches
    /// the stored one; the stored revision is then incremented. A deleted
    /// task is never written back.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Conflict`] when the stored revision
    /// differs from `task.revision()` and [`TaskRepositoryError::NotFound`]
    /// when a previously stored task no longer exists.
    async fn put(&self, task: &Task) -> TaskRepositoryResult<Task>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns the chat's tasks selected by `filter`, in no particular order.
    async fn list(&self, chat_id: ChatId, filter: StatusFilter) -> TaskRepositoryResult<Vec<Task>>;

    /// Removes a task. Returns `true` when a record existed.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<bool>;

    /// Removes a task only while it is still at `expected_revision`.
    ///
    /// Returns `false` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Conflict`] when the task changed since
    /// it was read.
    async fn delete_unchanged(
        &self,
        id: TaskId,
        expected_revision: u64,
    ) -> TaskRepositoryResult<bool>;

    /// Atomically appends a comment and bumps the task revision.
    ///
    /// Returns `false` when the task does not exist. Concurrent appends are
    /// never lost.
    async fn append_comment(&self, id: TaskId, comment: &Comment) -> TaskRepositoryResult<bool>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The task changed since it was read.
    #[error("task {0} was modified concurrently")]
    Conflict(TaskId),

    /// Storage is unreachable or rejected the operation.
    #[error("storage unavailable: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
