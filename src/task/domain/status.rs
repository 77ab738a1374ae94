//! Task lifecycle status and the transition table.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been created and nobody has claimed it.
    New,
    /// Someone is working on the task.
    InProgress,
    /// Task has been completed.
    Done,
    /// Task has been put away. No further transitions are possible.
    Archived,
}

impl TaskStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::New, Self::InProgress, Self::Done, Self::Archived];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }

    /// Returns `true` when `target` is an edge of the lifecycle graph.
    ///
    /// Staying in the same status is not an edge; callers treat it as a
    /// no-op before consulting this table.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::New, Self::InProgress | Self::Archived)
                | (Self::InProgress, Self::New | Self::Done | Self::Archived)
                | (Self::Done, Self::InProgress | Self::Archived)
        )
    }

    /// Returns `true` when no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Returns `true` for statuses that still need work.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::New | Self::InProgress)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Status selection for chat task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every status.
    #[default]
    All,
    /// `New` and `InProgress`.
    Open,
    /// A single status.
    Only(TaskStatus),
}

impl StatusFilter {
    /// Returns `true` when a task with `status` belongs to the selection.
    #[must_use]
    pub const fn matches(self, status: TaskStatus) -> bool {
        match self {
            Self::All => true,
            Self::Open => status.is_open(),
            Self::Only(selected) => selected as u8 == status as u8,
        }
    }

    /// Returns the storage representations selected by this filter, or
    /// `None` when every status matches.
    #[must_use]
    pub fn storage_values(self) -> Option<Vec<&'static str>> {
        match self {
            Self::All => None,
            Self::Open => Some(vec![
                TaskStatus::New.as_str(),
                TaskStatus::InProgress.as_str(),
            ]),
            Self::Only(status) => Some(vec![status.as_str()]),
        }
    }
}

impl From<TaskStatus> for StatusFilter {
    fn from(status: TaskStatus) -> Self {
        Self::Only(status)
    }
}

impl TryFrom<&str> for StatusFilter {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "open" => Ok(Self::Open),
            _ => TaskStatus::try_from(value).map(Self::Only),
        }
    }
}
