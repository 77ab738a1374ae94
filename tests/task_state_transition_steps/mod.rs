//! Step definitions for task state transition scenarios.

pub mod given;
pub mod then;
pub mod world;
