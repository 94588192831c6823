//! In-memory implementation of the `EventStore` trait.
//!
//! Events are kept in their encoded form, the way a durable backend would
//! hold them, and rebuilt through the [`TypeRegistry`] on load.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::registry::TypeRegistry;
use chronicle_core::repository::EventStore;
use chronicle_core::types::{AggregateType, EventType};

/// Stored representation of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Event type name for decoding.
    pub event_type: EventType,
    /// Encoded event payload.
    pub payload: serde_json::Value,
    /// Aggregate type of the stream.
    pub aggregate_type: AggregateType,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Position within the aggregate stream, starting at 1.
    pub version: i64,
    /// Timestamp of event creation.
    pub timestamp: DateTime<Utc>,
}

type StreamKey = (AggregateType, Uuid);

/// Event store holding every stream in process memory.
///
/// A single lock covers the version check and the append, so concurrent
/// saves on the same stream are linearized and exactly one of two saves
/// made from the same original version succeeds.
#[derive(Debug)]
pub struct MemoryEventStore {
    registry: Arc<TypeRegistry>,
    streams: RwLock<HashMap<StreamKey, Vec<StoredEvent>>>,
}

impl MemoryEventStore {
    /// Creates an empty store decoding payloads through `registry`.
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            streams: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the raw records of one stream in version order.
    pub async fn stored_events(&self, aggregate_type: &AggregateType, id: Uuid) -> Vec<StoredEvent> {
        self.streams
            .read()
            .await
            .get(&(aggregate_type.clone(), id))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the highest stored version of a stream, 0 when it is empty.
    pub async fn stream_version(&self, aggregate_type: &AggregateType, id: Uuid) -> i64 {
        self.streams
            .read()
            .await
            .get(&(aggregate_type.clone(), id))
            .map_or(0, |stream| current_version(stream))
    }

    /// Returns the number of streams holding at least one event.
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }
}

fn current_version(stream: &[StoredEvent]) -> i64 {
    stream.last().map_or(0, |record| record.version)
}

/// Encodes `events` and checks they form one contiguous append starting
/// right after `original_version`, with every event type decodable by
/// `registry`.
fn to_stored_batch(
    registry: &TypeRegistry,
    events: &[Event],
    original_version: i64,
) -> Result<(StreamKey, Vec<StoredEvent>), DomainError> {
    let mut key: Option<StreamKey> = None;
    let mut batch = Vec::with_capacity(events.len());

    for (expected_version, event) in (original_version + 1..).zip(events) {
        let (Some(aggregate_type), Some(aggregate_id)) =
            (event.aggregate_type(), event.aggregate_id())
        else {
            return Err(DomainError::InvalidEventBatch(format!(
                "event {event} is not bound to an aggregate"
            )));
        };

        let (batch_type, batch_id) =
            key.get_or_insert_with(|| (aggregate_type.clone(), aggregate_id));
        if batch_type != aggregate_type || *batch_id != aggregate_id {
            return Err(DomainError::InvalidEventBatch(format!(
                "event {event} belongs to {aggregate_type}/{aggregate_id}, \
                 batch targets {batch_type}/{batch_id}"
            )));
        }

        if !registry.is_event_registered(event.event_type()) {
            return Err(DomainError::EventDataNotRegistered(event.event_type().clone()));
        }

        if event.version() != expected_version {
            return Err(DomainError::InvalidEventBatch(format!(
                "event {event} should have version {expected_version}"
            )));
        }

        let payload = event.data().encode().map_err(|e| {
            DomainError::Infrastructure(format!("event serialization failed: {e}"))
        })?;
        batch.push(StoredEvent {
            event_type: event.event_type().clone(),
            payload,
            aggregate_type: aggregate_type.clone(),
            aggregate_id,
            version: event.version(),
            timestamp: event.timestamp(),
        });
    }

    let key = key.ok_or_else(|| DomainError::InvalidEventBatch("empty batch".into()))?;
    Ok((key, batch))
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn save(&self, events: &[Event], original_version: i64) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let (key, batch) = to_stored_batch(&self.registry, events, original_version)?;

        let mut streams = self.streams.write().await;
        let actual = streams.get(&key).map_or(0, |stream| current_version(stream));
        if actual != original_version {
            debug!(
                aggregate_type = %key.0,
                aggregate_id = %key.1,
                expected = original_version,
                actual,
                "rejected append on stale version"
            );
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: key.1,
                expected: original_version,
                actual,
            });
        }

        let stream = streams.entry(key.clone()).or_default();
        stream.extend(batch);
        debug!(
            aggregate_type = %key.0,
            aggregate_id = %key.1,
            version = current_version(stream),
            "appended events"
        );
        Ok(())
    }

    async fn load(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Vec<Event>, DomainError> {
        let records = self.stored_events(aggregate_type, id).await;

        records
            .into_iter()
            .map(|record| -> Result<Event, DomainError> {
                let data = self
                    .registry
                    .decode_event_data(&record.event_type, record.payload)?;
                Ok(
                    Event::from_parts(record.event_type, Arc::from(data), record.timestamp)
                        .for_aggregate(record.aggregate_type, record.aggregate_id, record.version),
                )
            })
            .collect()
    }
}
