//! Per-conversation interaction state used by multi-step chat flows.
//!
//! The lifecycle engine never reads this state. It belongs to whoever
//! dispatches chat events and only needs to survive between two requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Storage key of a conversation state record (a user or chat identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationKey(i64);

impl ConversationKey {
    /// Wraps a raw user or chat identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current interaction mode plus short-lived auxiliary data.
///
/// Saving replaces the whole record; merge the data map yourself before
/// saving if earlier entries must survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    mode: String,
    #[serde(default)]
    data: Map<String, Value>,
}

impl ConversationState {
    /// Nothing pending.
    pub const IDLE: &'static str = "idle";
    /// Waiting for the description of a task being created.
    pub const AWAITING_TASK_DESCRIPTION: &'static str = "awaiting_task_description";
    /// Waiting for the text of a comment.
    pub const AWAITING_COMMENT: &'static str = "awaiting_comment";
    /// Waiting for a deadline date to be picked.
    pub const AWAITING_DEADLINE: &'static str = "calendar_set_deadline";

    /// Creates a state in the given mode with no auxiliary data.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            data: Map::new(),
        }
    }

    /// Creates an idle state.
    #[must_use]
    pub fn idle() -> Self {
        Self::new(Self::IDLE)
    }

    /// Replaces the auxiliary data map.
    #[must_use]
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Returns the interaction mode tag.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Returns `true` when nothing is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.mode == Self::IDLE
    }

    /// Returns the auxiliary data map.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns a single auxiliary value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Inserts or replaces an auxiliary value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Removes an auxiliary value, returning it when present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Switches the mode while keeping the auxiliary data.
    pub fn set_mode(&mut self, mode: impl Into<String>) {
        self.mode = mode.into();
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::idle()
    }
}
