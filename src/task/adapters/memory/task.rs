//! In-memory task repository for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{ChatId, Comment, StatusFilter, Task, TaskId, TaskNumber},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// One lock guards tasks and counters, so every operation is linearizable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    chat_counters: HashMap<ChatId, u64>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn next_task_number(&self, chat_id: ChatId) -> TaskRepositoryResult<TaskNumber> {
        let mut state = self.write()?;
        let counter = state.chat_counters.entry(chat_id).or_insert(0);
        let next = counter.checked_add(1).ok_or_else(|| {
            TaskRepositoryError::persistence(std::io::Error::other(format!(
                "task counter overflow for chat {chat_id}"
            )))
        })?;
        let number = TaskNumber::new(next).map_err(TaskRepositoryError::persistence)?;
        *counter = next;
        Ok(number)
    }

    async fn put(&self, task: &Task) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let stored_revision = state.tasks.get(&task.id()).map(Task::revision);

        let next_revision = match stored_revision {
            None if task.revision() == 0 => 1,
            None => return Err(TaskRepositoryError::NotFound(task.id())),
            Some(current) if current == task.revision() => current.saturating_add(1),
            Some(_) => return Err(TaskRepositoryError::Conflict(task.id())),
        };

        let stored = task.clone().with_revision(next_revision);
        state.tasks.insert(task.id(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list(&self, chat_id: ChatId, filter: StatusFilter) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .values()
            .filter(|task| task.chat_id() == chat_id && filter.matches(task.status()))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        Ok(state.tasks.remove(&id).is_some())
    }

    async fn delete_unchanged(
        &self,
        id: TaskId,
        expected_revision: u64,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        match state.tasks.get(&id).map(Task::revision) {
            None => Ok(false),
            Some(current) if current == expected_revision => {
                state.tasks.remove(&id);
                Ok(true)
            }
            Some(_) => Err(TaskRepositoryError::Conflict(id)),
        }
    }

    async fn append_comment(&self, id: TaskId, comment: &Comment) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(false);
        };
        task.push_comment(comment.clone());
        let next_revision = task.revision().saturating_add(1);
        *task = task.clone().with_revision(next_revision);
        Ok(true)
    }
}
