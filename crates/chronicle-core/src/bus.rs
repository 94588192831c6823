//! Event bus abstractions.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::event::Event;
use crate::types::EventType;

/// Subscriber invoked only for events of the type it was registered for.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one published event.
    ///
    /// # Errors
    ///
    /// Failures are the handler's own concern: the bus logs them and never
    /// turns them into publish failures.
    async fn handle_event(&self, event: &Event) -> Result<(), DomainError>;
}

/// Subscriber invoked for every published event regardless of type.
#[async_trait]
pub trait EventObserver: Send + Sync {
    /// Observes one published event.
    ///
    /// # Errors
    ///
    /// Failures are logged by the bus and otherwise ignored.
    async fn notify(&self, event: &Event) -> Result<(), DomainError>;
}

/// How a bus delivers a published event to its subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlingStrategy {
    /// Every subscriber runs on the publisher's task in registration order
    /// and publishing returns once all have completed.
    #[default]
    Synchronous,
    /// Every subscriber invocation runs as an independent task; publishing
    /// returns immediately and no ordering is guaranteed.
    Asynchronous,
}

impl fmt::Display for HandlingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synchronous => f.write_str("synchronous"),
            Self::Asynchronous => f.write_str("asynchronous"),
        }
    }
}

/// Error returned when parsing an unknown handling strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown handling strategy: {0:?}")]
pub struct ParseHandlingStrategyError(String);

impl FromStr for HandlingStrategy {
    type Err = ParseHandlingStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Ok(Self::Synchronous),
            "async" | "asynchronous" => Ok(Self::Asynchronous),
            _ => Err(ParseHandlingStrategyError(s.to_owned())),
        }
    }
}

/// Publish/subscribe dispatcher for saved events.
///
/// Registration is expected to finish during startup, before concurrent
/// publishing begins.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Delivers `event` to every handler of its type and every observer,
    /// following the current handling strategy.
    async fn publish_event(&self, event: &Event);

    /// Registers `handler` for events of `event_type`.
    fn add_handler(&self, handler: Arc<dyn EventHandler>, event_type: EventType);

    /// Registers `observer` for all events.
    fn add_observer(&self, observer: Arc<dyn EventObserver>);

    /// Selects the handling strategy for subsequent publishes.
    fn set_handling_strategy(&self, strategy: HandlingStrategy);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_is_synchronous() {
        assert_eq!(HandlingStrategy::default(), HandlingStrategy::Synchronous);
    }

    #[test]
    fn test_strategy_parses_short_and_long_names() {
        assert_eq!("sync".parse(), Ok(HandlingStrategy::Synchronous));
        assert_eq!(" Asynchronous ".parse(), Ok(HandlingStrategy::Asynchronous));
        assert_eq!("async".parse(), Ok(HandlingStrategy::Asynchronous));
    }

    #[test]
    fn test_strategy_rejects_unknown_name() {
        let result = "parallel".parse::<HandlingStrategy>();

        assert_eq!(
            result.unwrap_err().to_string(),
            "unknown handling strategy: \"parallel\""
        );
    }

    #[test]
    fn test_strategy_display_round_trips_through_from_str() {
        for strategy in [HandlingStrategy::Synchronous, HandlingStrategy::Asynchronous] {
            assert_eq!(strategy.to_string().parse(), Ok(strategy));
        }
    }
}
