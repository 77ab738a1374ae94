//! In-memory conversation state store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{ConversationKey, ConversationState},
    ports::{ConversationStateError, ConversationStateRepository, ConversationStateResult},
};

/// Thread-safe in-memory conversation state store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStateRepository {
    states: Arc<RwLock<HashMap<ConversationKey, ConversationState>>>,
}

impl InMemoryConversationStateRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> ConversationStateError {
    ConversationStateError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ConversationStateRepository for InMemoryConversationStateRepository {
    async fn load(&self, key: ConversationKey) -> ConversationStateResult<Option<ConversationState>> {
        let states = self.states.read().map_err(poisoned)?;
        Ok(states.get(&key).cloned())
    }

    async fn save(
        &self,
        key: ConversationKey,
        state: &ConversationState,
    ) -> ConversationStateResult<()> {
        let mut states = self.states.write().map_err(poisoned)?;
        states.insert(key, state.clone());
        Ok(())
    }

    async fn clear(&self, key: ConversationKey) -> ConversationStateResult<bool> {
        let mut states = self.states.write().map_err(poisoned)?;
        Ok(states.remove(&key).is_some())
    }
}
