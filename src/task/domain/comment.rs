//! Comments and the acting-user identity attached to lifecycle changes.

use super::TaskDomainError;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A note appended to a task. Comments are never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    text: String,
    author: String,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a comment stamped with the current clock time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyCommentText`] when the text is blank.
    pub fn new(
        text: impl Into<String>,
        author: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let raw = text.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyCommentText);
        }
        Ok(Self {
            text: trimmed.to_owned(),
            author: author.into(),
            created_at: clock.utc(),
        })
    }

    /// Returns the comment body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the display identity of the author.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns when the comment was written.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Human-readable identity of the user requesting a lifecycle change.
///
/// Used for display only; authorization is decided by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    name: String,
    handle: Option<String>,
}

impl Actor {
    /// Creates an actor with a display name and no handle.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: None,
        }
    }

    /// Sets the platform handle, e.g. `@alice`. Blank handles are ignored.
    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        let raw = handle.into();
        let trimmed = raw.trim();
        self.handle = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the platform handle, if any.
    #[must_use]
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handle {
            Some(handle) => write!(f, "{} ({handle})", self.name),
            None => f.write_str(&self.name),
        }
    }
}
