//! Chat task tracking.
//!
//! Tasks move through a fixed status graph (`new`, `in_progress`, `done`,
//! `archived`). Every transition books the time spent in progress, resets
//! derived fields such as the rating, and is persisted with a single
//! revision-checked write. The module follows hexagonal architecture:
//!
//! - Domain types and the transition rules in [`domain`]
//! - Storage contracts in [`ports`]
//! - In-memory and `PostgreSQL` implementations in [`adapters`]
//! - The lifecycle engine, action dispatcher and statistics in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
