//! Port for the key-value store behind multi-step chat flows.

use crate::task::domain::{ConversationKey, ConversationState};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for conversation state operations.
pub type ConversationStateResult<T> = Result<T, ConversationStateError>;

/// Conversation state persistence contract.
#[async_trait]
pub trait ConversationStateRepository: Send + Sync {
    /// Loads the state for `key`, or `None` when nothing was saved.
    async fn load(&self, key: ConversationKey) -> ConversationStateResult<Option<ConversationState>>;

    /// Replaces the state for `key` wholesale.
    async fn save(&self, key: ConversationKey, state: &ConversationState)
    -> ConversationStateResult<()>;

    /// Removes the state for `key`. Returns `true` when a record existed.
    async fn clear(&self, key: ConversationKey) -> ConversationStateResult<bool>;
}

/// Errors returned by conversation state implementations.
#[derive(Debug, Clone, Error)]
pub enum ConversationStateError {
    /// Storage is unreachable or rejected the operation.
    #[error("storage unavailable: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConversationStateError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
