//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task description is empty after trimming.
    #[error("task text must not be empty")]
    EmptyTaskText,

    /// The comment text is empty after trimming.
    #[error("comment text must not be empty")]
    EmptyCommentText,

    /// Task numbers start at one.
    #[error("invalid task number {0}, expected a positive integer")]
    InvalidTaskNumber(u64),

    /// The rating is outside the `1..=5` range.
    #[error("invalid rating {0}, expected a value between 1 and 5")]
    InvalidRating(u8),

    /// Ratings only apply to completed tasks.
    #[error("task {task_id} cannot be rated while {status}")]
    RatingRequiresDone {
        /// Task that rejected the rating.
        task_id: TaskId,
        /// Status at the time of the request.
        status: TaskStatus,
    },

    /// The requested status change is not an edge of the lifecycle graph.
    #[error("invalid state transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task that rejected the transition.
        task_id: TaskId,
        /// Status at the time of the request.
        from: TaskStatus,
        /// Requested target status.
        to: TaskStatus,
    },
}

/// Error returned while parsing task statuses from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
