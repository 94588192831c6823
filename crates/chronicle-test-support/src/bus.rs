//! Test subscribers and a recording `EventBus`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chronicle_core::bus::{EventBus, EventHandler, EventObserver, HandlingStrategy};
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::types::EventType;

/// Shared, ordered log of subscriber invocations.
///
/// Entries read `"<subscriber>:<type>@<version>"`.
#[derive(Debug, Clone, Default)]
pub struct SubscriberLog(Arc<Mutex<Vec<String>>>);

impl SubscriberLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Waits until the log holds at least `count` entries or `timeout`
    /// elapses, then returns the entries.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let entries = self.entries();
            if entries.len() >= count || tokio::time::Instant::now() >= deadline {
                return entries;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }
}

/// A handler/observer that appends each delivery to a [`SubscriberLog`].
///
/// It can be configured to sleep before recording (to expose ordering) or
/// to fail after recording (to check failure isolation).
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    name: String,
    log: SubscriberLog,
    delay: Option<Duration>,
    fail: bool,
}

impl RecordingHandler {
    /// Creates a handler that records under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &SubscriberLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            delay: None,
            fail: false,
        }
    }

    /// Sleeps for `delay` before recording each delivery.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns an error after recording each delivery.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    async fn record(&self, event: &Event) -> Result<(), DomainError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.log.push(format!("{}:{event}", self.name));
        if self.fail {
            return Err(DomainError::Infrastructure(format!(
                "{} failed on {event}",
                self.name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle_event(&self, event: &Event) -> Result<(), DomainError> {
        self.record(event).await
    }
}

#[async_trait]
impl EventObserver for RecordingHandler {
    async fn notify(&self, event: &Event) -> Result<(), DomainError> {
        self.record(event).await
    }
}

/// An event bus that only records published events, in publish order.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    published: Mutex<Vec<Event>>,
}

impl RecordingEventBus {
    /// Creates an empty recording bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published_events(&self) -> Vec<Event> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish_event(&self, event: &Event) {
        self.published.lock().unwrap().push(event.clone());
    }

    fn add_handler(&self, _handler: Arc<dyn EventHandler>, _event_type: EventType) {}

    fn add_observer(&self, _observer: Arc<dyn EventObserver>) {}

    fn set_handling_strategy(&self, _strategy: HandlingStrategy) {}
}
