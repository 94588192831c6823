//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::types::{AggregateType, CommandType, EventType};

/// Misconfiguration detected while populating a [`TypeRegistry`].
///
/// These are fatal: the startup sequence must refuse to serve traffic when a
/// registration fails.
///
/// [`TypeRegistry`]: crate::registry::TypeRegistry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An aggregate constructor declared an empty aggregate type.
    #[error("attempt to register empty aggregate type")]
    EmptyAggregateType,

    /// An event payload was registered under an empty event type.
    #[error("attempt to register empty event type")]
    EmptyEventType,

    /// The event type already has a payload registered.
    #[error("registering duplicate types for \"{0}\"")]
    DuplicateEventType(EventType),
}

/// Top-level runtime error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No constructor is registered for the aggregate type.
    #[error("aggregate type not registered: {0}")]
    AggregateNotRegistered(AggregateType),

    /// No payload codec is registered for the event type.
    #[error("event data not registered: {0}")]
    EventDataNotRegistered(EventType),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The aggregate does not know how to handle the command.
    #[error("aggregate {aggregate_type} cannot handle command {command_type}")]
    UnhandledCommand {
        /// The aggregate the command was sent to.
        aggregate_type: AggregateType,
        /// The rejected command.
        command_type: CommandType,
    },

    /// A batch handed to the event store does not form a valid stream append.
    #[error("invalid event batch: {0}")]
    InvalidEventBatch(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
