//! Adaptive review scheduling: when should a question be shown again.

pub mod algorithm;
pub mod engine;
pub mod error_conversions;
pub mod error_responses;

pub use algorithm::{next_ease, next_interval, Quality};
pub use engine::ReviewScheduler;
