//! Events and their payloads.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::types::{AggregateType, EventType};

/// Abstraction over system time used to stamp events.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Type-specific event payload.
///
/// Implemented for every serializable payload type. The concrete type is
/// recovered with [`Event::data_as`]; the encoded form is what event stores
/// persist and what the registry decodes back.
pub trait EventData: Send + Sync + fmt::Debug + 'static {
    /// Encodes the payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be represented as JSON.
    fn encode(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Returns the payload as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T> EventData for T
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An immutable fact produced by an aggregate.
///
/// A free-standing event has version 0 and no aggregate linkage. Events built
/// through an aggregate carry its type, id and the version the event will
/// occupy in the stream once applied.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: EventType,
    data: Arc<dyn EventData>,
    aggregate_type: Option<AggregateType>,
    aggregate_id: Option<Uuid>,
    version: i64,
    timestamp: DateTime<Utc>,
}

impl Event {
    /// Creates an unbound event stamped with the current system time.
    #[must_use]
    pub fn new(event_type: EventType, data: impl EventData) -> Self {
        Self::with_clock(event_type, data, &SystemClock)
    }

    /// Creates an unbound event stamped by `clock`.
    #[must_use]
    pub fn with_clock(event_type: EventType, data: impl EventData, clock: &dyn Clock) -> Self {
        Self::from_parts(event_type, Arc::new(data), clock.now())
    }

    /// Creates an unbound event from an already shared payload and a known
    /// timestamp. Used when rebuilding events from storage.
    #[must_use]
    pub fn from_parts(
        event_type: EventType,
        data: Arc<dyn EventData>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type,
            data,
            aggregate_type: None,
            aggregate_id: None,
            version: 0,
            timestamp,
        }
    }

    /// Binds the event to a position in an aggregate stream.
    #[must_use]
    pub fn for_aggregate(
        mut self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
        version: i64,
    ) -> Self {
        self.aggregate_type = Some(aggregate_type);
        self.aggregate_id = Some(aggregate_id);
        self.version = version;
        self
    }

    /// Returns the event type.
    #[must_use]
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Returns the type-erased payload.
    #[must_use]
    pub fn data(&self) -> &dyn EventData {
        self.data.as_ref()
    }

    /// Returns the payload as `T`, or `None` if it holds another type.
    #[must_use]
    pub fn data_as<T: 'static>(&self) -> Option<&T> {
        self.data.as_ref().as_any().downcast_ref::<T>()
    }

    /// Returns the aggregate type, if the event is bound to a stream.
    #[must_use]
    pub fn aggregate_type(&self) -> Option<&AggregateType> {
        self.aggregate_type.as_ref()
    }

    /// Returns the aggregate id, if the event is bound to a stream.
    #[must_use]
    pub fn aggregate_id(&self) -> Option<Uuid> {
        self.aggregate_id
    }

    /// Returns the 1-based position in the stream, or 0 when unbound.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the creation time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.event_type, self.version)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde::Deserialize;

    use super::*;

    const TEST_EVENT: EventType = EventType::from_static("TestEvent");

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestEventData {
        content: String,
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_new_event_is_unbound_at_version_zero() {
        // Arrange
        let data = TestEventData {
            content: "event1".to_owned(),
        };

        // Act
        let event = Event::new(TEST_EVENT, data.clone());

        // Assert
        assert_eq!(event.event_type(), &TEST_EVENT);
        assert_eq!(event.data_as::<TestEventData>(), Some(&data));
        assert_eq!(event.version(), 0);
        assert!(event.aggregate_type().is_none());
        assert!(event.aggregate_id().is_none());
        assert!(event.timestamp().timestamp() > 0);
        assert_eq!(event.to_string(), "TestEvent@0");
    }

    #[test]
    fn test_with_clock_uses_clock_time() {
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        let event = Event::with_clock(
            TEST_EVENT,
            TestEventData {
                content: "x".to_owned(),
            },
            &FixedClock(fixed_now),
        );

        assert_eq!(event.timestamp(), fixed_now);
    }

    #[test]
    fn test_for_aggregate_stamps_linkage_and_version() {
        let id = Uuid::new_v4();

        let event = Event::new(
            TEST_EVENT,
            TestEventData {
                content: "x".to_owned(),
            },
        )
        .for_aggregate(AggregateType::from_static("TestAggregate"), id, 3);

        assert_eq!(event.aggregate_type().map(AggregateType::as_str), Some("TestAggregate"));
        assert_eq!(event.aggregate_id(), Some(id));
        assert_eq!(event.version(), 3);
        assert_eq!(event.to_string(), "TestEvent@3");
    }

    #[test]
    fn test_data_as_returns_none_for_other_type() {
        let event = Event::new(TEST_EVENT, 42_u32);

        assert!(event.data_as::<TestEventData>().is_none());
        assert_eq!(event.data_as::<u32>(), Some(&42));
    }

    #[test]
    fn test_encode_produces_json_payload() {
        let event = Event::new(
            TEST_EVENT,
            TestEventData {
                content: "hello".to_owned(),
            },
        );

        let json = event.data().encode().unwrap();

        assert_eq!(json, serde_json::json!({ "content": "hello" }));
    }

    #[test]
    fn test_clones_share_the_same_payload() {
        let event = Event::new(
            TEST_EVENT,
            TestEventData {
                content: "shared".to_owned(),
            },
        );

        let copy = event.clone();

        assert!(std::ptr::eq(
            event.data_as::<TestEventData>().unwrap(),
            copy.data_as::<TestEventData>().unwrap()
        ));
    }
}
