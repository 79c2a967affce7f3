//! Spaced-repetition review scheduling for study questions.
//!
//! The scheduler core lives in [`features::scheduler`] and runs against any
//! [`data::repositories::ReviewRepository`]. The HTTP surface in [`handlers`]
//! exposes it to signed-in learners.

pub mod config;
pub mod data;
pub mod features;
pub mod handlers;
pub mod schema;
pub mod utils;
