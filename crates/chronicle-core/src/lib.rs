//! Chronicle core: the event-sourcing write path.
//!
//! This crate defines the aggregate lifecycle, the type registries that make
//! events and aggregates reconstructible by name, the repository with its
//! optimistic-concurrency contract against an event store, and the event bus
//! contract. It contains no infrastructure code.

pub mod aggregate;
pub mod bus;
pub mod command;
pub mod error;
pub mod event;
pub mod handler;
pub mod registry;
pub mod repository;
pub mod types;
