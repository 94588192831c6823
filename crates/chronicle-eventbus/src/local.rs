//! In-process event bus.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, warn};

use chronicle_core::bus::{EventBus, EventHandler, EventObserver, HandlingStrategy};
use chronicle_core::event::Event;
use chronicle_core::types::EventType;

type HandlerMap = HashMap<EventType, Vec<Arc<dyn EventHandler>>>;

/// Dispatches published events to handlers and observers living in the same
/// process.
///
/// With [`HandlingStrategy::Synchronous`] the handlers registered for the
/// event's type run first, in registration order, followed by every
/// observer in registration order; `publish_event` returns once all of them
/// have completed. With [`HandlingStrategy::Asynchronous`] each subscriber
/// invocation is spawned as its own tokio task and `publish_event` returns
/// immediately. Spawned tasks can be awaited with [`LocalEventBus::drain`].
///
/// Subscriber failures are logged at `warn` and never reach the publisher.
#[derive(Default)]
pub struct LocalEventBus {
    handlers: RwLock<HandlerMap>,
    observers: RwLock<Vec<Arc<dyn EventObserver>>>,
    strategy: RwLock<HandlingStrategy>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl LocalEventBus {
    /// Creates a bus with the default synchronous strategy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus using `strategy`.
    #[must_use]
    pub fn with_strategy(strategy: HandlingStrategy) -> Self {
        Self {
            strategy: RwLock::new(strategy),
            ..Self::default()
        }
    }

    /// Returns the strategy applied to the next publish.
    #[must_use]
    pub fn handling_strategy(&self) -> HandlingStrategy {
        *self
            .strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for every subscriber task spawned by asynchronous publishes,
    /// including tasks spawned while draining.
    pub async fn drain(&self) {
        loop {
            let handles = std::mem::take(
                &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
            );
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    error!(error = %e, "subscriber task did not complete");
                }
            }
        }
    }

    fn subscribers_for(
        &self,
        event_type: &EventType,
    ) -> (Vec<Arc<dyn EventHandler>>, Vec<Arc<dyn EventObserver>>) {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
            .unwrap_or_default();
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        (handlers, observers)
    }

    fn track(&self, spawned: Vec<JoinHandle<()>>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|handle| !handle.is_finished());
        pending.extend(spawned);
    }
}

async fn run_handler(handler: &dyn EventHandler, event: &Event) {
    if let Err(e) = handler.handle_event(event).await {
        warn!(event = %event, error = %e, "event handler failed");
    }
}

async fn run_observer(observer: &dyn EventObserver, event: &Event) {
    if let Err(e) = observer.notify(event).await {
        warn!(event = %event, error = %e, "event observer failed");
    }
}

#[async_trait]
impl EventBus for LocalEventBus {
    async fn publish_event(&self, event: &Event) {
        let (handlers, observers) = self.subscribers_for(event.event_type());
        let strategy = self.handling_strategy();
        debug!(
            event = %event,
            %strategy,
            handlers = handlers.len(),
            observers = observers.len(),
            "publishing event"
        );

        match strategy {
            HandlingStrategy::Synchronous => {
                for handler in &handlers {
                    run_handler(handler.as_ref(), event).await;
                }
                for observer in &observers {
                    run_observer(observer.as_ref(), event).await;
                }
            }
            HandlingStrategy::Asynchronous => {
                let mut spawned = Vec::with_capacity(handlers.len() + observers.len());
                for handler in handlers {
                    let event = event.clone();
                    spawned.push(tokio::spawn(
                        async move { run_handler(handler.as_ref(), &event).await }
                            .in_current_span(),
                    ));
                }
                for observer in observers {
                    let event = event.clone();
                    spawned.push(tokio::spawn(
                        async move { run_observer(observer.as_ref(), &event).await }
                            .in_current_span(),
                    ));
                }
                self.track(spawned);
            }
        }
    }

    fn add_handler(&self, handler: Arc<dyn EventHandler>, event_type: EventType) {
        debug!(%event_type, "handler registered");
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    fn add_observer(&self, observer: Arc<dyn EventObserver>) {
        debug!("observer registered");
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    fn set_handling_strategy(&self, strategy: HandlingStrategy) {
        *self
            .strategy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = strategy;
    }
}

impl fmt::Debug for LocalEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: usize = self
            .handlers
            .read()
            .map_or(0, |map| map.values().map(Vec::len).sum());
        let observers = self.observers.read().map_or(0, |list| list.len());
        f.debug_struct("LocalEventBus")
            .field("strategy", &self.handling_strategy())
            .field("handlers", &handlers)
            .field("observers", &observers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bus_is_synchronous() {
        assert_eq!(LocalEventBus::new().handling_strategy(), HandlingStrategy::Synchronous);
    }

    #[test]
    fn test_set_handling_strategy_replaces_strategy() {
        let bus = LocalEventBus::new();

        bus.set_handling_strategy(HandlingStrategy::Asynchronous);

        assert_eq!(bus.handling_strategy(), HandlingStrategy::Asynchronous);
    }

    #[tokio::test]
    async fn test_drain_without_pending_tasks_returns() {
        let bus = LocalEventBus::with_strategy(HandlingStrategy::Asynchronous);

        bus.drain().await;

        assert!(bus.pending.lock().unwrap().is_empty());
    }
}
