//! Taskmate: task tracking for group and private chats.
//!
//! Chat members create small tasks, claim them, complete them, rate the
//! result and archive them. This crate owns the task lifecycle and its time
//! accounting, the task store with its per-chat numbering, and the layers
//! a chat front end calls into.
//!
//! # Architecture
//!
//! Taskmate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle, storage and action dispatch
//! - [`config`]: Layered settings
//! - [`telemetry`]: Tracing subscriber setup

pub mod config;
pub mod task;
pub mod telemetry;
