//! Service layer for task creation, status transitions and task edits.

use super::statistics::{ChatStatistics, format_duration};
use crate::config::EngineSettings;
use crate::task::{
    domain::{
        Actor, ChatId, Comment, NewTask, ParseTaskStatusError, Rating, StatusFilter, Task,
        TaskDomainError, TaskId, TaskStatus, TimeAccrual, TransitionOutcome,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::NaiveDate;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    chat_id: ChatId,
    text: String,
    created_by: String,
    deadline: Option<NaiveDate>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(chat_id: ChatId, text: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            created_by: created_by.into(),
            deadline: None,
        }
    }

    /// Sets the initial deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Request payload for a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTaskRequest {
    task_id: TaskId,
    target: TaskStatus,
    actor: Option<Actor>,
}

impl TransitionTaskRequest {
    /// Creates a transition request without an acting user.
    #[must_use]
    pub const fn new(task_id: TaskId, target: TaskStatus) -> Self {
        Self {
            task_id,
            target,
            actor: None,
        }
    }

    /// Sets the acting user recorded as assignee when entering `InProgress`.
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the requested status.
    #[must_use]
    pub const fn target(&self) -> TaskStatus {
        self.target
    }
}

/// Coarse failure classification shared by every service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The referenced task does not exist.
    NotFound,
    /// The requested change is not allowed from the current status.
    InvalidTransition,
    /// The request carried an unusable value.
    InvalidInput,
    /// Storage failed or stayed contended; the request may be retried.
    StorageUnavailable,
    /// The requester may not perform the action.
    Forbidden,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// The task does not exist.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// Persisted or requested state string was invalid.
    #[error(transparent)]
    InvalidState(#[from] ParseTaskStatusError),
}

impl TaskLifecycleError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) | Self::Repository(TaskRepositoryError::NotFound(_)) => {
                FailureKind::NotFound
            }
            Self::Repository(_) => FailureKind::StorageUnavailable,
            Self::Domain(
                TaskDomainError::InvalidStateTransition { .. }
                | TaskDomainError::RatingRequiresDone { .. },
            ) => FailureKind::InvalidTransition,
            Self::Domain(_) | Self::InvalidState(_) => FailureKind::InvalidInput,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Every mutation reads the task, computes the complete new record in memory
/// and issues a single revision-checked write. A write that loses a race is
/// recomputed from a fresh read.
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    settings: EngineSettings,
}

impl<R, C> Clone for TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            settings: self.settings,
        }
    }
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service with default engine settings.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_settings(repository, clock, EngineSettings::default())
    }

    /// Creates a new task lifecycle service with explicit engine settings.
    #[must_use]
    pub const fn with_settings(
        repository: Arc<R>,
        clock: Arc<C>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            repository,
            clock,
            settings,
        }
    }

    /// Returns the engine settings in use.
    #[must_use]
    pub const fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Creates a task in the `New` status with the next number of its chat.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the text is blank, before
    /// any number is taken, and [`TaskLifecycleError::Repository`] when
    /// storage fails.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let CreateTaskRequest {
            chat_id,
            text,
            created_by,
            deadline,
        } = request;
        if text.trim().is_empty() {
            return Err(TaskDomainError::EmptyTaskText.into());
        }

        let task_number = self.repository.next_task_number(chat_id).await?;
        let task = Task::new(
            NewTask {
                chat_id,
                task_number,
                text,
                created_by,
                deadline,
            },
            &*self.clock,
        )?;
        let stored = self.repository.put(&task).await?;
        info!(
            task_id = %stored.id(),
            chat_id = %chat_id,
            task_number = %task_number,
            "task created"
        );
        Ok(stored)
    }

    /// Moves a task to the requested status.
    ///
    /// A request for the current status returns the task without writing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task is absent,
    /// [`TaskLifecycleError::Domain`] for an edge outside the transition
    /// table, and [`TaskLifecycleError::Repository`] when storage fails or
    /// conflicts persist past the retry budget.
    pub async fn transition(&self, request: TransitionTaskRequest) -> TaskLifecycleResult<Task> {
        let TransitionTaskRequest {
            task_id,
            target,
            actor,
        } = request;
        let policy = self.settings.reassign_policy;
        let mut last_outcome: Option<TransitionOutcome> = None;

        let stored = self
            .update_with(task_id, |task| {
                let outcome = task.transition_to(target, actor.as_ref(), policy, &*self.clock)?;
                last_outcome = Some(outcome);
                Ok(outcome.changed())
            })
            .await?;

        if let Some(outcome) = last_outcome.filter(TransitionOutcome::changed) {
            report_accrual(&stored, outcome.accrual);
            debug!(
                task_id = %stored.id(),
                task_number = %stored.task_number(),
                from = %outcome.from,
                to = %outcome.to,
                "task transitioned"
            );
        }
        Ok(stored)
    }

    /// Moves a task to the status named by `target`, e.g. `"done"`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::InvalidState`] for an unknown status
    /// name, otherwise as [`Self::transition`].
    pub async fn transition_named(
        &self,
        task_id: TaskId,
        target: &str,
        actor: Option<Actor>,
    ) -> TaskLifecycleResult<Task> {
        let status = TaskStatus::try_from(target)?;
        let request = TransitionTaskRequest {
            task_id,
            target: status,
            actor,
        };
        self.transition(request).await
    }

    /// Rates a completed task with 1 to 5 stars.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for an out-of-range rating
    /// (checked before any read) or when the task is not `Done`, and
    /// [`TaskLifecycleError::NotFound`] when the task is absent.
    pub async fn rate(&self, task_id: TaskId, stars: u8) -> TaskLifecycleResult<Task> {
        let rating = Rating::new(stars)?;
        self.update_with(task_id, |task| task.rate(rating)).await
    }

    /// Overwrites or clears the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task is absent and
    /// [`TaskLifecycleError::Repository`] when storage fails.
    pub async fn set_deadline(
        &self,
        task_id: TaskId,
        deadline: Option<NaiveDate>,
    ) -> TaskLifecycleResult<Task> {
        self.update_with(task_id, |task| Ok(task.set_deadline(deadline)))
            .await
    }

    /// Appends a comment through the repository's atomic append.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for blank text and
    /// [`TaskLifecycleError::NotFound`] when the task is absent.
    pub async fn add_comment(
        &self,
        task_id: TaskId,
        text: &str,
        author: impl Into<String>,
    ) -> TaskLifecycleResult<Task> {
        let comment = Comment::new(text, author, &*self.clock)?;
        if !self.repository.append_comment(task_id, &comment).await? {
            return Err(TaskLifecycleError::NotFound(task_id));
        }
        self.get(task_id).await
    }

    /// Permanently removes a task. Returns `false` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when storage fails.
    pub async fn delete(&self, task_id: TaskId) -> TaskLifecycleResult<bool> {
        let removed = self.repository.delete(task_id).await?;
        if removed {
            info!(task_id = %task_id, "task deleted");
        }
        Ok(removed)
    }

    /// Removes `task` only if the stored record is still the copy given.
    ///
    /// Callers that checked a rule against `task` use this so the rule still
    /// holds when the record disappears.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] with
    /// [`TaskRepositoryError::Conflict`] when the task changed since it was
    /// read.
    pub async fn delete_unchanged(&self, task: &Task) -> TaskLifecycleResult<bool> {
        let removed = self
            .repository
            .delete_unchanged(task.id(), task.revision())
            .await?;
        if removed {
            info!(task_id = %task.id(), task_number = %task.task_number(), "task deleted");
        }
        Ok(removed)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when storage fails.
    pub async fn find(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    /// Retrieves a task, treating absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task is absent.
    pub async fn get(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.find(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    /// Lists a chat's tasks matching `filter`, ordered by task number.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when storage fails.
    pub async fn list(
        &self,
        chat_id: ChatId,
        filter: StatusFilter,
    ) -> TaskLifecycleResult<Vec<Task>> {
        let mut tasks = self.repository.list(chat_id, filter).await?;
        tasks.sort_by_key(Task::task_number);
        Ok(tasks)
    }

    /// Aggregates status counts, tracked time and ratings for a chat.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when storage fails.
    pub async fn statistics(&self, chat_id: ChatId) -> TaskLifecycleResult<ChatStatistics> {
        let tasks = self.repository.list(chat_id, StatusFilter::All).await?;
        Ok(ChatStatistics::collect(&tasks))
    }

    /// Read, mutate, conditionally write; recompute on revision conflicts.
    ///
    /// `mutate` returns `false` when nothing changed, in which case no write
    /// is issued.
    async fn update_with<F>(&self, task_id: TaskId, mut mutate: F) -> TaskLifecycleResult<Task>
    where
        F: FnMut(&mut Task) -> Result<bool, TaskDomainError> + Send,
    {
        let mut retries = 0_u32;
        loop {
            let mut task = self.get(task_id).await?;
            if !mutate(&mut task)? {
                return Ok(task);
            }

            match self.repository.put(&task).await {
                Ok(stored) => return Ok(stored),
                Err(TaskRepositoryError::Conflict(conflicting))
                    if retries < self.settings.max_conflict_retries =>
                {
                    retries = retries.saturating_add(1);
                    warn!(
                        task_id = %conflicting,
                        retry = retries,
                        "revision conflict, recomputing from fresh state"
                    );
                }
                Err(TaskRepositoryError::NotFound(missing)) => {
                    warn!(task_id = %missing, "task deleted while being updated");
                    return Err(TaskLifecycleError::NotFound(missing));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn report_accrual(task: &Task, accrual: TimeAccrual) {
    match accrual {
        TimeAccrual::MissingStart => warn!(
            task_id = %task.id(),
            task_number = %task.task_number(),
            "left in_progress without a start timestamp; no time booked"
        ),
        TimeAccrual::ClockSkew { started_at } => warn!(
            task_id = %task.id(),
            task_number = %task.task_number(),
            started_at = %started_at,
            "in_progress start lies in the future; no time booked"
        ),
        TimeAccrual::Accrued { seconds } => debug!(
            task_id = %task.id(),
            seconds,
            booked = %format_duration(seconds),
            total = %format_duration(task.accumulated_time_seconds()),
            "time booked"
        ),
        TimeAccrual::NotTracked => {}
    }
}
