//! Chronicle event bus.
//!
//! Provides [`local::LocalEventBus`], an in-process implementation of the
//! `EventBus` contract with synchronous and asynchronous delivery.

pub mod local;
