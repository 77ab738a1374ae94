//! Task aggregate root and the lifecycle side effects of status changes.

use super::{
    Actor, ChatId, Comment, Rating, TaskDomainError, TaskId, TaskNumber, TaskStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// How entering `InProgress` treats an existing assignee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReassignPolicy {
    /// The acting user becomes the assignee whenever one is supplied.
    #[default]
    Always,
    /// The acting user only fills an empty assignee; reopening keeps the
    /// original one.
    KeepExisting,
}

/// Time booked while leaving `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAccrual {
    /// The task was not in progress, so nothing was booked.
    NotTracked,
    /// Elapsed seconds added to the accumulated total.
    Accrued {
        /// Seconds added by this transition.
        seconds: u64,
    },
    /// The task was in progress without a start timestamp; nothing booked.
    MissingStart,
    /// The start timestamp lies in the future; nothing booked.
    ClockSkew {
        /// The recorded start of the in-progress interval.
        started_at: DateTime<Utc>,
    },
}

impl TimeAccrual {
    /// Returns `true` for the anomalies that callers should report.
    #[must_use]
    pub const fn is_anomaly(self) -> bool {
        matches!(self, Self::MissingStart | Self::ClockSkew { .. })
    }
}

/// Result of a validated transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Status before the request.
    pub from: TaskStatus,
    /// Status after the request.
    pub to: TaskStatus,
    /// Time booked while leaving `InProgress`.
    pub accrual: TimeAccrual,
}

impl TransitionOutcome {
    /// Returns `false` for the same-status no-op.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.from as u8 != self.to as u8
    }
}

/// Parameter object for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Owning chat.
    pub chat_id: ChatId,
    /// Number taken from the chat counter.
    pub task_number: TaskNumber,
    /// Free-text description.
    pub text: String,
    /// Display identity of the creator.
    pub created_by: String,
    /// Optional due date.
    pub deadline: Option<NaiveDate>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    chat_id: ChatId,
    task_number: TaskNumber,
    text: String,
    created_by: String,
    status: TaskStatus,
    assigned_to: Option<String>,
    deadline: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    in_progress_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    accumulated_time_seconds: u64,
    rating: Option<Rating>,
    comments: Vec<Comment>,
    revision: u64,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning chat.
    pub chat_id: ChatId,
    /// Persisted per-chat number.
    pub task_number: TaskNumber,
    /// Persisted description.
    pub text: String,
    /// Persisted creator identity.
    pub created_by: String,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted assignee, if any.
    pub assigned_to: Option<String>,
    /// Persisted deadline, if any.
    pub deadline: Option<NaiveDate>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Start of the current in-progress interval, if any.
    pub in_progress_at: Option<DateTime<Utc>>,
    /// Persisted completion timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted accumulated work time.
    pub accumulated_time_seconds: u64,
    /// Persisted rating, if any.
    pub rating: Option<Rating>,
    /// Persisted comments in insertion order.
    pub comments: Vec<Comment>,
    /// Storage revision of the record.
    pub revision: u64,
}

impl Task {
    /// Creates a new task in the `New` status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskText`] when the description is
    /// blank.
    pub fn new(new_task: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let NewTask {
            chat_id,
            task_number,
            text,
            created_by,
            deadline,
        } = new_task;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTaskText);
        }

        Ok(Self {
            id: TaskId::new(),
            chat_id,
            task_number,
            text: trimmed.to_owned(),
            created_by,
            status: TaskStatus::New,
            assigned_to: None,
            deadline,
            created_at: clock.utc(),
            in_progress_at: None,
            completed_at: None,
            accumulated_time_seconds: 0,
            rating: None,
            comments: Vec::new(),
            revision: 0,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            chat_id: data.chat_id,
            task_number: data.task_number,
            text: data.text,
            created_by: data.created_by,
            status: data.status,
            assigned_to: data.assigned_to,
            deadline: data.deadline,
            created_at: data.created_at,
            in_progress_at: data.in_progress_at,
            completed_at: data.completed_at,
            accumulated_time_seconds: data.accumulated_time_seconds,
            rating: data.rating,
            comments: data.comments,
            revision: data.revision,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning chat.
    #[must_use]
    pub const fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Returns the per-chat display number.
    #[must_use]
    pub const fn task_number(&self) -> TaskNumber {
        self.task_number
    }

    /// Returns the task description.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the creator identity.
    #[must_use]
    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub fn assigned_to(&self) -> Option<&str> {
        self.assigned_to.as_deref()
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<NaiveDate> {
        self.deadline
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the current in-progress interval started.
    #[must_use]
    pub const fn in_progress_at(&self) -> Option<DateTime<Utc>> {
        self.in_progress_at
    }

    /// Returns the completion timestamp, if any.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the total seconds spent in progress over closed intervals.
    #[must_use]
    pub const fn accumulated_time_seconds(&self) -> u64 {
        self.accumulated_time_seconds
    }

    /// Returns the rating, if any.
    #[must_use]
    pub const fn rating(&self) -> Option<Rating> {
        self.rating
    }

    /// Returns the comments in insertion order.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Returns the storage revision this copy was read at.
    ///
    /// Zero means the task has never been stored.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns a copy carrying the given storage revision.
    ///
    /// Repository adapters call this after a successful write.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Moves the task to `target`, applying every derived side effect.
    ///
    /// A request for the current status succeeds without touching any field.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when `target` is
    /// not reachable from the current status. The task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        actor: Option<&Actor>,
        policy: ReassignPolicy,
        clock: &impl Clock,
    ) -> Result<TransitionOutcome, TaskDomainError> {
        let from = self.status;
        if from == target {
            return Ok(TransitionOutcome {
                from,
                to: target,
                accrual: TimeAccrual::NotTracked,
            });
        }
        if !from.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from,
                to: target,
            });
        }

        let accrual = self.apply_transition(target, actor, policy, clock.utc());
        Ok(TransitionOutcome {
            from,
            to: target,
            accrual,
        })
    }

    /// Applies the side effects of a validated transition at `now`.
    fn apply_transition(
        &mut self,
        target: TaskStatus,
        actor: Option<&Actor>,
        policy: ReassignPolicy,
        now: DateTime<Utc>,
    ) -> TimeAccrual {
        let accrual = if self.status == TaskStatus::InProgress {
            self.close_in_progress_interval(now)
        } else {
            TimeAccrual::NotTracked
        };

        match target {
            TaskStatus::InProgress => {
                self.in_progress_at = Some(now);
                if let Some(acting) = actor {
                    let keep = policy == ReassignPolicy::KeepExisting && self.assigned_to.is_some();
                    if !keep {
                        self.assigned_to = Some(acting.to_string());
                    }
                }
                self.completed_at = None;
                self.rating = None;
            }
            TaskStatus::Done => {
                self.completed_at = Some(now);
                self.rating = None;
            }
            TaskStatus::New => {
                self.assigned_to = None;
                self.completed_at = None;
                self.rating = None;
            }
            TaskStatus::Archived => {}
        }

        self.status = target;
        accrual
    }

    fn close_in_progress_interval(&mut self, now: DateTime<Utc>) -> TimeAccrual {
        let Some(started_at) = self.in_progress_at.take() else {
            return TimeAccrual::MissingStart;
        };
        let Ok(seconds) = u64::try_from(now.signed_duration_since(started_at).num_seconds()) else {
            return TimeAccrual::ClockSkew { started_at };
        };
        self.accumulated_time_seconds = self.accumulated_time_seconds.saturating_add(seconds);
        TimeAccrual::Accrued { seconds }
    }

    /// Rates a completed task. Returns `false` when the rating is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::RatingRequiresDone`] unless the task is
    /// `Done`.
    pub fn rate(&mut self, rating: Rating) -> Result<bool, TaskDomainError> {
        if self.status != TaskStatus::Done {
            return Err(TaskDomainError::RatingRequiresDone {
                task_id: self.id,
                status: self.status,
            });
        }
        if self.rating == Some(rating) {
            return Ok(false);
        }
        self.rating = Some(rating);
        Ok(true)
    }

    /// Overwrites the deadline. Returns `false` when it is unchanged.
    pub fn set_deadline(&mut self, deadline: Option<NaiveDate>) -> bool {
        if self.deadline == deadline {
            return false;
        }
        self.deadline = deadline;
        true
    }

    /// Appends a comment to the in-memory copy.
    ///
    /// Persisted tasks must receive comments through the repository's atomic
    /// append instead.
    pub fn push_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }
}
