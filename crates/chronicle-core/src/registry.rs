//! Type registries for aggregates and event payloads.
//!
//! A [`TypeRegistry`] maps symbolic names to constructors so the generic
//! runtime (repository, stores, bus) can rebuild domain types it has no
//! compile-time knowledge of. It is populated once during startup through
//! `&mut self` registration calls and then shared read-only behind an `Arc`,
//! which makes concurrent lookups lock-free.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::error::{ConfigError, DomainError};
use crate::event::EventData;
use crate::types::{AggregateType, EventType};

type AggregateConstructor = Box<dyn Fn(Uuid) -> Box<dyn Aggregate> + Send + Sync>;

/// Creation and decoding functions for one registered payload type.
struct EventDataCodec {
    create: fn() -> Box<dyn EventData>,
    decode: fn(serde_json::Value) -> Result<Box<dyn EventData>, serde_json::Error>,
}

fn create_data<D>() -> Box<dyn EventData>
where
    D: EventData + Default,
{
    Box::new(D::default())
}

fn decode_data<D>(value: serde_json::Value) -> Result<Box<dyn EventData>, serde_json::Error>
where
    D: EventData + DeserializeOwned,
{
    Ok(Box::new(serde_json::from_value::<D>(value)?))
}

/// Registry of aggregate constructors and event payload codecs.
#[derive(Default)]
pub struct TypeRegistry {
    aggregates: HashMap<AggregateType, AggregateConstructor>,
    events: HashMap<EventType, EventDataCodec>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an aggregate constructor under the type the constructed
    /// aggregate declares for itself.
    ///
    /// Registering the same aggregate type again replaces the constructor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyAggregateType` if the constructed aggregate
    /// reports an empty type.
    pub fn register_aggregate<F>(&mut self, constructor: F) -> Result<(), ConfigError>
    where
        F: Fn(Uuid) -> Box<dyn Aggregate> + Send + Sync + 'static,
    {
        let aggregate_type = constructor(Uuid::nil()).aggregate_type().clone();
        if aggregate_type.is_empty() {
            return Err(ConfigError::EmptyAggregateType);
        }

        if self
            .aggregates
            .insert(aggregate_type.clone(), Box::new(constructor))
            .is_some()
        {
            warn!(%aggregate_type, "replaced aggregate constructor");
        } else {
            debug!(%aggregate_type, "registered aggregate");
        }
        Ok(())
    }

    /// Registers the payload type `D` for `event_type`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyEventType` for an empty name and
    /// `ConfigError::DuplicateEventType` if the name is already taken; the
    /// earlier registration stays in effect.
    pub fn register_event_data<D>(&mut self, event_type: EventType) -> Result<(), ConfigError>
    where
        D: EventData + Default + DeserializeOwned,
    {
        if event_type.is_empty() {
            return Err(ConfigError::EmptyEventType);
        }
        if self.events.contains_key(&event_type) {
            return Err(ConfigError::DuplicateEventType(event_type));
        }

        debug!(%event_type, payload = std::any::type_name::<D>(), "registered event data");
        self.events.insert(
            event_type,
            EventDataCodec {
                create: create_data::<D>,
                decode: decode_data::<D>,
            },
        );
        Ok(())
    }

    /// Instantiates a fresh aggregate of `aggregate_type` with the given id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotRegistered` for an unknown type.
    pub fn create_aggregate(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Box<dyn Aggregate>, DomainError> {
        let constructor = self
            .aggregates
            .get(aggregate_type)
            .ok_or_else(|| DomainError::AggregateNotRegistered(aggregate_type.clone()))?;
        Ok(constructor(id))
    }

    /// Returns a zero-valued payload for `event_type`, ready to be populated.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventDataNotRegistered` for an unknown type.
    pub fn create_event_data(&self, event_type: &EventType) -> Result<Box<dyn EventData>, DomainError> {
        Ok((self.codec(event_type)?.create)())
    }

    /// Rebuilds a payload of `event_type` from its encoded form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventDataNotRegistered` for an unknown type and
    /// `DomainError::Infrastructure` if the value does not match the payload.
    pub fn decode_event_data(
        &self,
        event_type: &EventType,
        value: serde_json::Value,
    ) -> Result<Box<dyn EventData>, DomainError> {
        (self.codec(event_type)?.decode)(value).map_err(|e| {
            DomainError::Infrastructure(format!("event deserialization failed: {e}"))
        })
    }

    /// Returns `true` if a constructor is registered for `aggregate_type`.
    #[must_use]
    pub fn is_aggregate_registered(&self, aggregate_type: &AggregateType) -> bool {
        self.aggregates.contains_key(aggregate_type)
    }

    /// Returns `true` if a payload is registered for `event_type`.
    #[must_use]
    pub fn is_event_registered(&self, event_type: &EventType) -> bool {
        self.events.contains_key(event_type)
    }

    fn codec(&self, event_type: &EventType) -> Result<&EventDataCodec, DomainError> {
        self.events
            .get(event_type)
            .ok_or_else(|| DomainError::EventDataNotRegistered(event_type.clone()))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("aggregates", &self.aggregates.keys().collect::<Vec<_>>())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .finish()
    }
}
