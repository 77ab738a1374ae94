//! Diesel row models for task persistence.

use super::schema::{conversation_states, tasks};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Owning chat.
    pub chat_id: i64,
    /// Per-chat display number.
    pub task_number: i64,
    /// Free-text description.
    pub text: String,
    /// Creator display identity.
    pub created_by: String,
    /// Lifecycle status.
    pub status: String,
    /// Assignee display identity.
    pub assigned_to: Option<String>,
    /// Optional due date.
    pub deadline: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Start of the current in-progress interval.
    pub in_progress_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds spent in progress over closed intervals.
    pub accumulated_time_seconds: i64,
    /// Star rating.
    pub rating: Option<i16>,
    /// Comment JSON array.
    pub comments: Value,
    /// Optimistic-concurrency revision.
    pub revision: i64,
}

/// Insert and full-replacement model for task records.
///
/// `None` fields are written as `NULL`, which is how cleared lifecycle
/// fields reach storage.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskRecord {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Owning chat.
    pub chat_id: i64,
    /// Per-chat display number.
    pub task_number: i64,
    /// Free-text description.
    pub text: String,
    /// Creator display identity.
    pub created_by: String,
    /// Lifecycle status.
    pub status: String,
    /// Assignee display identity.
    pub assigned_to: Option<String>,
    /// Optional due date.
    pub deadline: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Start of the current in-progress interval.
    pub in_progress_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds spent in progress over closed intervals.
    pub accumulated_time_seconds: i64,
    /// Star rating.
    pub rating: Option<i16>,
    /// Comment JSON array.
    pub comments: Value,
    /// Revision to store.
    pub revision: i64,
}

/// Row model for conversation state records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = conversation_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConversationStateRow {
    /// User or chat identifier.
    pub conversation_key: i64,
    /// Interaction mode tag.
    pub mode: String,
    /// Auxiliary data map.
    pub data: Value,
}
