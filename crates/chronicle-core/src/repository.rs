//! Event store contract and the event-sourcing repository.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::bus::EventBus;
use crate::error::DomainError;
use crate::event::Event;
use crate::registry::TypeRegistry;
use crate::types::AggregateType;

/// Ordered, per-stream event persistence with optimistic concurrency.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends `events` to the stream they belong to, but only if the
    /// stream's highest stored version equals `original_version`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` when the stream has moved
    /// past `original_version`, or any storage failure.
    async fn save(&self, events: &[Event], original_version: i64) -> Result<(), DomainError>;

    /// Loads the full stream of an aggregate in ascending version order.
    /// A stream with no history yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the stream cannot be read.
    async fn load(&self, aggregate_type: &AggregateType, id: Uuid)
    -> Result<Vec<Event>, DomainError>;
}

/// Loads aggregates by replaying their streams and saves their uncommitted
/// events, publishing them once the store has accepted them.
#[derive(Clone)]
pub struct Repository {
    registry: Arc<TypeRegistry>,
    store: Arc<dyn EventStore>,
    bus: Option<Arc<dyn EventBus>>,
}

impl Repository {
    /// Creates a repository that does not publish saved events.
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>, store: Arc<dyn EventStore>) -> Self {
        Self {
            registry,
            store,
            bus: None,
        }
    }

    /// Publishes every saved event on `bus`.
    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Returns the registry used to instantiate aggregates.
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Instantiates the aggregate and replays its stored events in order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotRegistered` for an unknown type, or
    /// the store's error if the stream cannot be loaded.
    #[instrument(skip(self))]
    pub async fn load(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Box<dyn Aggregate>, DomainError> {
        let mut aggregate = self.registry.create_aggregate(aggregate_type, id)?;

        let events = self.store.load(aggregate_type, id).await?;
        for event in &events {
            aggregate.apply(event);
        }

        debug!(version = aggregate.version(), "aggregate loaded");
        Ok(aggregate)
    }

    /// Appends the aggregate's uncommitted events, publishes them and clears
    /// the buffer. Nothing happens when the buffer is empty.
    ///
    /// The buffer is cleared only after the store accepts the batch; on any
    /// error it is left intact and nothing is published.
    ///
    /// Saved events are not applied to `aggregate`, so its version still
    /// predates them; reload it before handling another command.
    ///
    /// # Errors
    ///
    /// Returns the store's error, typically `DomainError::ConcurrencyConflict`.
    #[instrument(
        skip_all,
        fields(
            aggregate_type = %aggregate.aggregate_type(),
            aggregate_id = %aggregate.aggregate_id(),
        )
    )]
    pub async fn save(&self, aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        let events = aggregate.uncommitted_events();
        if events.is_empty() {
            return Ok(());
        }

        let original_version = aggregate.version();
        self.store.save(events, original_version).await?;
        info!(
            original_version,
            count = events.len(),
            "saved uncommitted events"
        );

        if let Some(bus) = &self.bus {
            for event in events {
                bus.publish_event(event).await;
            }
        }

        aggregate.clear_uncommitted_events();
        Ok(())
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("registry", &self.registry)
            .field("publishes", &self.bus.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Mutex;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::aggregate::AggregateBase;
    use crate::bus::{EventHandler, EventObserver, HandlingStrategy};
    use crate::command::Command;
    use crate::types::{CommandType, EventType};

    const NOTE: AggregateType = AggregateType::from_static("Note");
    const NOTE_WRITTEN: EventType = EventType::from_static("NoteWritten");

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct NoteWritten {
        text: String,
    }

    #[derive(Debug)]
    struct WriteNote {
        id: Uuid,
        text: String,
    }

    impl Command for WriteNote {
        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn aggregate_type(&self) -> AggregateType {
            NOTE
        }

        fn command_type(&self) -> CommandType {
            CommandType::from_static("WriteNote")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct Note {
        base: AggregateBase,
        text: String,
    }

    impl Aggregate for Note {
        fn base(&self) -> &AggregateBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut AggregateBase {
            &mut self.base
        }

        fn handle_command(&mut self, command: &dyn Command) -> Result<(), DomainError> {
            let write = command
                .downcast_ref::<WriteNote>()
                .ok_or_else(|| DomainError::Validation("unexpected command".into()))?;
            let event = self.new_event(
                NOTE_WRITTEN,
                NoteWritten {
                    text: write.text.clone(),
                },
            );
            self.store_event(event);
            Ok(())
        }

        fn apply_event(&mut self, event: &Event) {
            if let Some(data) = event.data_as::<NoteWritten>() {
                self.text.clone_from(&data.text);
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn registry() -> Arc<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        registry
            .register_aggregate(|id| {
                Box::new(Note {
                    base: AggregateBase::new(NOTE, id),
                    text: String::new(),
                })
            })
            .unwrap();
        registry
            .register_event_data::<NoteWritten>(NOTE_WRITTEN)
            .unwrap();
        Arc::new(registry)
    }

    #[derive(Default)]
    struct MockEventStore {
        load_result: Mutex<Vec<Event>>,
        saved: Mutex<Vec<(i64, Vec<Event>)>>,
        reject_saves: bool,
    }

    #[async_trait]
    impl EventStore for MockEventStore {
        async fn save(&self, events: &[Event], original_version: i64) -> Result<(), DomainError> {
            if self.reject_saves {
                return Err(DomainError::ConcurrencyConflict {
                    aggregate_id: events[0].aggregate_id().unwrap_or_default(),
                    expected: original_version,
                    actual: original_version + 1,
                });
            }
            self.saved
                .lock()
                .unwrap()
                .push((original_version, events.to_vec()));
            Ok(())
        }

        async fn load(
            &self,
            _aggregate_type: &AggregateType,
            _id: Uuid,
        ) -> Result<Vec<Event>, DomainError> {
            Ok(self.load_result.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct MockEventBus {
        published: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventBus for MockEventBus {
        async fn publish_event(&self, event: &Event) {
            self.published.lock().unwrap().push(event.to_string());
        }

        fn add_handler(&self, _handler: Arc<dyn EventHandler>, _event_type: EventType) {}

        fn add_observer(&self, _observer: Arc<dyn EventObserver>) {}

        fn set_handling_strategy(&self, _strategy: HandlingStrategy) {}
    }

    fn written(id: Uuid, version: i64, text: &str) -> Event {
        Event::new(
            NOTE_WRITTEN,
            NoteWritten {
                text: text.to_owned(),
            },
        )
        .for_aggregate(NOTE, id, version)
    }

    #[tokio::test]
    async fn test_load_replays_stored_events_in_order() {
        // Arrange
        let id = Uuid::new_v4();
        let store = Arc::new(MockEventStore::default());
        *store.load_result.lock().unwrap() = vec![written(id, 1, "first"), written(id, 2, "second")];
        let repo = Repository::new(registry(), store);

        // Act
        let aggregate = repo.load(&NOTE, id).await.unwrap();

        // Assert
        assert_eq!(aggregate.version(), 2);
        assert_eq!(aggregate.aggregate_id(), id);
        let note = aggregate.as_any().downcast_ref::<Note>().unwrap();
        assert_eq!(note.text, "second");
        assert!(aggregate.uncommitted_events().is_empty());
    }

    #[tokio::test]
    async fn test_load_fails_for_unregistered_aggregate_type() {
        let repo = Repository::new(registry(), Arc::new(MockEventStore::default()));

        let result = repo
            .load(&AggregateType::from_static("Unknown"), Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(DomainError::AggregateNotRegistered(_))));
    }

    #[tokio::test]
    async fn test_save_appends_with_original_version_publishes_and_clears() {
        // Arrange
        let id = Uuid::new_v4();
        let store = Arc::new(MockEventStore::default());
        *store.load_result.lock().unwrap() = vec![written(id, 1, "first")];
        let bus = Arc::new(MockEventBus::default());
        let repo = Repository::new(registry(), store.clone()).with_event_bus(bus.clone());
        let mut aggregate = repo.load(&NOTE, id).await.unwrap();
        aggregate
            .handle_command(&WriteNote {
                id,
                text: "second".to_owned(),
            })
            .unwrap();

        // Act
        repo.save(aggregate.as_mut()).await.unwrap();

        // Assert
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, 1);
        assert_eq!(saved[0].1.len(), 1);
        assert_eq!(saved[0].1[0].version(), 2);
        assert_eq!(*bus.published.lock().unwrap(), vec!["NoteWritten@2".to_owned()]);
        assert!(aggregate.uncommitted_events().is_empty());
    }

    #[tokio::test]
    async fn test_save_with_empty_buffer_is_noop() {
        let store = Arc::new(MockEventStore::default());
        let bus = Arc::new(MockEventBus::default());
        let repo = Repository::new(registry(), store.clone()).with_event_bus(bus.clone());
        let mut aggregate = repo.load(&NOTE, Uuid::new_v4()).await.unwrap();

        repo.save(aggregate.as_mut()).await.unwrap();

        assert!(store.saved.lock().unwrap().is_empty());
        assert!(bus.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_save_keeps_buffer_and_publishes_nothing() {
        // Arrange
        let id = Uuid::new_v4();
        let store = Arc::new(MockEventStore {
            reject_saves: true,
            ..MockEventStore::default()
        });
        let bus = Arc::new(MockEventBus::default());
        let repo = Repository::new(registry(), store).with_event_bus(bus.clone());
        let mut aggregate = repo.load(&NOTE, id).await.unwrap();
        aggregate
            .handle_command(&WriteNote {
                id,
                text: "lost".to_owned(),
            })
            .unwrap();

        // Act
        let result = repo.save(aggregate.as_mut()).await;

        // Assert
        assert!(matches!(result, Err(DomainError::ConcurrencyConflict { .. })));
        assert_eq!(aggregate.uncommitted_events().len(), 1);
        assert!(bus.published.lock().unwrap().is_empty());
    }
}
