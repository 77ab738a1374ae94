//! Domain model for the task lifecycle.
//!
//! The domain holds the status graph, the time-accounting rules applied on
//! every transition, and the value objects shared by ports and services.
//! Nothing here touches storage or the chat platform.

mod comment;
mod conversation;
mod error;
mod ids;
mod rating;
mod status;
mod task;

pub use comment::{Actor, Comment};
pub use conversation::{ConversationKey, ConversationState};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{ChatId, TaskId, TaskNumber};
pub use rating::Rating;
pub use status::{StatusFilter, TaskStatus};
pub use task::{
    NewTask, PersistedTaskData, ReassignPolicy, Task, TimeAccrual, TransitionOutcome,
};
