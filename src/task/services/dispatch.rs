//! Normalized chat actions mapped onto lifecycle operations.
//!
//! The dispatcher is the only place that knows who is asking. It applies the
//! creator-only rules for archive and delete before calling the lifecycle
//! service, which itself is unconditional on actor identity.

use super::lifecycle::{
    CreateTaskRequest, FailureKind, TaskLifecycleError, TaskLifecycleService,
    TransitionTaskRequest,
};
use crate::config::AuthorizationSettings;
use crate::task::{
    domain::{Actor, ChatId, Task, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::NaiveDate;
use mockable::Clock;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// An action requested from the chat front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskAction {
    /// Claim a task: `New` to `InProgress`.
    Take,
    /// Finish a task: `InProgress` to `Done`.
    Complete,
    /// Return a task to the backlog: `InProgress` to `New`.
    Cancel,
    /// Retire a task permanently.
    Archive,
    /// Resume a finished task: `Done` to `InProgress`.
    Reopen,
    /// Hard-delete a task.
    Delete,
    /// Rate a completed task.
    Rate,
    /// Set or clear the deadline.
    SetDeadline,
    /// Append a comment.
    AddComment,
    /// Create a task.
    Create,
}

impl TaskAction {
    /// Returns the canonical action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Take => "take",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Archive => "archive",
            Self::Reopen => "reopen",
            Self::Delete => "delete",
            Self::Rate => "rate",
            Self::SetDeadline => "set_deadline",
            Self::AddComment => "add_comment",
            Self::Create => "create",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown action name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task action: {0}")]
pub struct ParseTaskActionError(pub String);

impl TryFrom<&str> for TaskAction {
    type Error = ParseTaskActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "take" => Ok(Self::Take),
            "complete" | "done" => Ok(Self::Complete),
            "cancel" | "reopen_new" => Ok(Self::Cancel),
            "archive" => Ok(Self::Archive),
            "reopen" | "reopen_in_progress" => Ok(Self::Reopen),
            "delete" => Ok(Self::Delete),
            "rate" => Ok(Self::Rate),
            "set_deadline" => Ok(Self::SetDeadline),
            "add_comment" => Ok(Self::AddComment),
            "create" => Ok(Self::Create),
            _ => Err(ParseTaskActionError(value.to_owned())),
        }
    }
}

/// A normalized action request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionRequest {
    action: TaskAction,
    task_id: Option<TaskId>,
    chat_id: Option<ChatId>,
    text: Option<String>,
    actor: Option<Actor>,
    requester: Option<String>,
    rating: Option<u8>,
    deadline: Option<NaiveDate>,
    comment_text: Option<String>,
}

impl TaskActionRequest {
    /// Creates an empty request for `action`.
    #[must_use]
    pub const fn new(action: TaskAction) -> Self {
        Self {
            action,
            task_id: None,
            chat_id: None,
            text: None,
            actor: None,
            requester: None,
            rating: None,
            deadline: None,
            comment_text: None,
        }
    }

    /// Creates an empty request from an action name.
    ///
    /// # Errors
    ///
    /// Returns [`ParseTaskActionError`] for an unknown name.
    pub fn named(action: &str) -> Result<Self, ParseTaskActionError> {
        TaskAction::try_from(action).map(Self::new)
    }

    /// Sets the target task.
    #[must_use]
    pub const fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Sets the chat for `create`.
    #[must_use]
    pub const fn with_chat_id(mut self, chat_id: ChatId) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Sets the description for `create`.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the acting user recorded as assignee.
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Sets the identity compared against the task creator.
    #[must_use]
    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    /// Sets the star rating for `rate`.
    #[must_use]
    pub const fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Sets the deadline for `set_deadline` or `create`.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the comment body for `add_comment`.
    #[must_use]
    pub fn with_comment_text(mut self, comment_text: impl Into<String>) -> Self {
        self.comment_text = Some(comment_text.into());
        self
    }

    /// Returns the requested action.
    #[must_use]
    pub const fn action(&self) -> TaskAction {
        self.action
    }

    fn author(&self) -> Option<String> {
        self.requester
            .clone()
            .or_else(|| self.actor.as_ref().map(ToString::to_string))
    }
}

/// Result of a dispatched action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The task after the action.
    Task(Task),
    /// Whether a delete removed a record.
    Deleted(bool),
}

/// Errors raised while dispatching an action.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The lifecycle service rejected the operation.
    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),

    /// The action name was not recognised.
    #[error(transparent)]
    InvalidAction(#[from] ParseTaskActionError),

    /// A field the action needs was not supplied.
    #[error("action requires field '{0}'")]
    MissingField(&'static str),

    /// The requester may not perform the action.
    #[error("{action} on task {task_id} is not allowed: {reason}")]
    Forbidden {
        /// The rejected action.
        action: TaskAction,
        /// The target task.
        task_id: TaskId,
        /// Which rule rejected it.
        reason: &'static str,
    },

    /// The target task does not exist.
    #[error("task {0} not found")]
    NotFound(TaskId),
}

impl DispatchError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Lifecycle(err) => err.kind(),
            Self::InvalidAction(_) | Self::MissingField(_) => FailureKind::InvalidInput,
            Self::Forbidden { .. } => FailureKind::Forbidden,
            Self::NotFound(_) => FailureKind::NotFound,
        }
    }
}

/// Result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Routes normalized actions to the lifecycle service.
pub struct TaskActionDispatcher<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    service: TaskLifecycleService<R, C>,
    authorization: AuthorizationSettings,
}

impl<R, C> Clone for TaskActionDispatcher<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            authorization: self.authorization,
        }
    }
}

impl<R, C> TaskActionDispatcher<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher over `service`.
    #[must_use]
    pub const fn new(
        service: TaskLifecycleService<R, C>,
        authorization: AuthorizationSettings,
    ) -> Self {
        Self {
            service,
            authorization,
        }
    }

    /// Returns the wrapped lifecycle service.
    #[must_use]
    pub const fn service(&self) -> &TaskLifecycleService<R, C> {
        &self.service
    }

    /// Executes one action.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingField`] when the request lacks a field
    /// the action needs, [`DispatchError::Forbidden`] when an authorization
    /// rule rejects the requester, and [`DispatchError::Lifecycle`] for
    /// failures reported by the lifecycle service.
    pub async fn dispatch(&self, request: TaskActionRequest) -> DispatchResult<DispatchOutcome> {
        let action = request.action;
        debug!(action = %action, task_id = ?request.task_id, "dispatching task action");

        match action {
            TaskAction::Take | TaskAction::Reopen => {
                self.dispatch_transition(request, TaskStatus::InProgress)
                    .await
            }
            TaskAction::Complete => self.dispatch_transition(request, TaskStatus::Done).await,
            TaskAction::Cancel => self.dispatch_transition(request, TaskStatus::New).await,
            TaskAction::Archive => {
                self.dispatch_transition(request, TaskStatus::Archived)
                    .await
            }
            TaskAction::Create => self.dispatch_create(request).await,
            TaskAction::Delete => self.dispatch_delete(&request).await,
            TaskAction::Rate => {
                let task_id = required_task_id(&request)?;
                let stars = request.rating.ok_or(DispatchError::MissingField("rating"))?;
                let task = self.service.rate(task_id, stars).await?;
                Ok(DispatchOutcome::Task(task))
            }
            TaskAction::SetDeadline => {
                let task_id = required_task_id(&request)?;
                let task = self.service.set_deadline(task_id, request.deadline).await?;
                Ok(DispatchOutcome::Task(task))
            }
            TaskAction::AddComment => {
                let task_id = required_task_id(&request)?;
                let author = request
                    .author()
                    .ok_or(DispatchError::MissingField("requester"))?;
                let text = request
                    .comment_text
                    .as_deref()
                    .ok_or(DispatchError::MissingField("comment_text"))?;
                let task = self.service.add_comment(task_id, text, author).await?;
                Ok(DispatchOutcome::Task(task))
            }
        }
    }

    async fn dispatch_transition(
        &self,
        request: TaskActionRequest,
        target: TaskStatus,
    ) -> DispatchResult<DispatchOutcome> {
        let task_id = required_task_id(&request)?;
        if request.action == TaskAction::Archive && self.authorization.creator_only_archive {
            let task = self.load(task_id).await?;
            ensure_creator(&request, &task, "only the creator may archive a task")?;
        }

        let mut transition = TransitionTaskRequest::new(task_id, target);
        if let Some(actor) = request.actor {
            transition = transition.with_actor(actor);
        }
        let task = self.service.transition(transition).await?;
        Ok(DispatchOutcome::Task(task))
    }

    async fn dispatch_create(&self, request: TaskActionRequest) -> DispatchResult<DispatchOutcome> {
        let chat_id = request
            .chat_id
            .ok_or(DispatchError::MissingField("chat_id"))?;
        let created_by = request
            .author()
            .ok_or(DispatchError::MissingField("requester"))?;
        let text = request.text.ok_or(DispatchError::MissingField("text"))?;

        let mut create = CreateTaskRequest::new(chat_id, text, created_by);
        if let Some(deadline) = request.deadline {
            create = create.with_deadline(deadline);
        }
        let task = self.service.create(create).await?;
        Ok(DispatchOutcome::Task(task))
    }

    async fn dispatch_delete(&self, request: &TaskActionRequest) -> DispatchResult<DispatchOutcome> {
        let task_id = required_task_id(request)?;
        if !self.authorization.creator_only_delete {
            let removed = self.service.delete(task_id).await?;
            return Ok(DispatchOutcome::Deleted(removed));
        }

        // The rules are checked against one revision and the delete only
        // applies to that revision; a concurrent change re-runs the checks.
        let mut retries = 0_u32;
        loop {
            let Some(task) = self.service.find(task_id).await? else {
                return Ok(DispatchOutcome::Deleted(false));
            };
            ensure_creator(request, &task, "only the creator may delete a task")?;
            if task.status() != TaskStatus::New {
                return Err(DispatchError::Forbidden {
                    action: TaskAction::Delete,
                    task_id,
                    reason: "only new tasks can be deleted",
                });
            }

            match self.service.delete_unchanged(&task).await {
                Ok(removed) => return Ok(DispatchOutcome::Deleted(removed)),
                Err(TaskLifecycleError::Repository(TaskRepositoryError::Conflict(_)))
                    if retries < self.service.settings().max_conflict_retries =>
                {
                    retries = retries.saturating_add(1);
                    warn!(
                        task_id = %task_id,
                        retry = retries,
                        "task changed before delete, rechecking"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn load(&self, task_id: TaskId) -> DispatchResult<Task> {
        self.service
            .find(task_id)
            .await?
            .ok_or(DispatchError::NotFound(task_id))
    }
}

fn required_task_id(request: &TaskActionRequest) -> DispatchResult<TaskId> {
    request
        .task_id
        .ok_or(DispatchError::MissingField("task_id"))
}

fn ensure_creator(
    request: &TaskActionRequest,
    task: &Task,
    reason: &'static str,
) -> DispatchResult<()> {
    let requester = request
        .requester
        .as_deref()
        .ok_or(DispatchError::MissingField("requester"))?;
    if requester == task.created_by() {
        Ok(())
    } else {
        Err(DispatchError::Forbidden {
            action: request.action,
            task_id: task.id(),
            reason,
        })
    }
}
