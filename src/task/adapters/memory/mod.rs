//! In-memory adapter implementations.
//!
//! These adapters keep everything behind a process-local lock. They back the
//! unit and integration tests and suit single-process deployments.

mod conversation;
mod task;

pub use conversation::InMemoryConversationStateRepository;
pub use task::InMemoryTaskRepository;
