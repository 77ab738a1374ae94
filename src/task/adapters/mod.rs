//! Adapter implementations for the task ports.
//!
//! - [`memory`]: process-local storage behind a lock
//! - [`postgres`]: Diesel-backed `PostgreSQL` storage

pub mod memory;
pub mod postgres;
