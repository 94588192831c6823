//! Domain model for the user accounts context.

pub mod aggregates;
pub mod commands;
pub mod events;
