//! Application services for the user accounts context.

pub mod projections;
pub mod query_handlers;
pub mod registration;
