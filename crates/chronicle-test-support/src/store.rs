//! Mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::repository::EventStore;
use chronicle_core::types::AggregateType;
use uuid::Uuid;

/// An event store that records every `save` call. Returns the configured
/// stream from every `load` call and always accepts saves.
#[derive(Debug, Default)]
pub struct RecordingEventStore {
    load_result: Mutex<Vec<Event>>,
    saved: Mutex<Vec<(i64, Vec<Event>)>>,
    loaded: Mutex<Vec<(AggregateType, Uuid)>>,
}

impl RecordingEventStore {
    /// Create a recording store that returns `load_result` from every `load`.
    #[must_use]
    pub fn new(load_result: Vec<Event>) -> Self {
        Self {
            load_result: Mutex::new(load_result),
            ..Self::default()
        }
    }

    /// Returns a snapshot of every `(original_version, events)` pair saved.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved_batches(&self) -> Vec<(i64, Vec<Event>)> {
        self.saved.lock().unwrap().clone()
    }

    /// Returns the streams that were requested from `load`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn loaded_streams(&self) -> Vec<(AggregateType, Uuid)> {
        self.loaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn save(&self, events: &[Event], original_version: i64) -> Result<(), DomainError> {
        self.saved
            .lock()
            .unwrap()
            .push((original_version, events.to_vec()));
        Ok(())
    }

    async fn load(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Vec<Event>, DomainError> {
        self.loaded
            .lock()
            .unwrap()
            .push((aggregate_type.clone(), id));
        Ok(self.load_result.lock().unwrap().clone())
    }
}

/// An event store that always returns an empty stream and silently accepts
/// saves. Useful for creation commands.
#[derive(Debug)]
pub struct EmptyEventStore;

#[async_trait]
impl EventStore for EmptyEventStore {
    async fn save(&self, _events: &[Event], _original_version: i64) -> Result<(), DomainError> {
        Ok(())
    }

    async fn load(
        &self,
        _aggregate_type: &AggregateType,
        _id: Uuid,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(vec![])
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn save(&self, _events: &[Event], _original_version: i64) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load(
        &self,
        _aggregate_type: &AggregateType,
        _id: Uuid,
    ) -> Result<Vec<Event>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
