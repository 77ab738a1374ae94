//! `PostgreSQL` adapters for task and conversation state persistence.
//!
//! Apply the SQL under `migrations/` before use. [`SCHEMA_SQL`] bundles the
//! same statements for callers that bootstrap a database themselves.

mod conversation;
mod models;
mod repository;
mod schema;

pub use conversation::PostgresConversationStateRepository;
pub use repository::{PostgresTaskRepository, TaskPgPool};

/// Schema creation statements for every table used by the adapters.
pub const SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000000_create_task_tables/up.sql");
