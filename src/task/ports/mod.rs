//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod conversation;
pub mod repository;

pub use conversation::{
    ConversationStateError, ConversationStateRepository, ConversationStateResult,
};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
