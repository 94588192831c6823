//! Chronicle event store implementations.

pub mod memory_event_store;
