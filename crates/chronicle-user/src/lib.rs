//! User accounts bounded context.
//!
//! A small event-sourced domain built on `chronicle-core`: the `User`
//! aggregate, its commands and events, a query handler and a read-model
//! projection fed by the event bus.

pub mod application;
pub mod domain;
