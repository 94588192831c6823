//! Aggregate root abstraction.

use std::any::Any;

use uuid::Uuid;

use crate::command::Command;
use crate::error::DomainError;
use crate::event::{Clock, Event, EventData, SystemClock};
use crate::types::{AggregateType, EventType};

/// Bookkeeping shared by every aggregate: identity, version and the buffer of
/// events not yet saved.
///
/// Domain aggregates embed a base and expose it through
/// [`Aggregate::base`] and [`Aggregate::base_mut`].
#[derive(Debug, Clone)]
pub struct AggregateBase {
    aggregate_type: AggregateType,
    id: Uuid,
    version: i64,
    uncommitted_events: Vec<Event>,
}

impl AggregateBase {
    /// Creates a base at version 0 with an empty buffer.
    #[must_use]
    pub fn new(aggregate_type: AggregateType, id: Uuid) -> Self {
        Self {
            aggregate_type,
            id,
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the aggregate type.
    #[must_use]
    pub fn aggregate_type(&self) -> &AggregateType {
        &self.aggregate_type
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the number of events applied so far.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Records that one more event has been applied.
    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    /// Builds an event bound to this aggregate at `version + 1`.
    ///
    /// The event is only valid for the current version: every event created
    /// before the next apply gets the same version, so a batch can hold at
    /// most one such event.
    #[must_use]
    pub fn new_event(&self, event_type: EventType, data: impl EventData, clock: &dyn Clock) -> Event {
        Event::with_clock(event_type, data, clock).for_aggregate(
            self.aggregate_type.clone(),
            self.id,
            self.version + 1,
        )
    }

    /// Appends an event to the uncommitted buffer.
    pub fn store_event(&mut self, event: Event) {
        self.uncommitted_events.push(event);
    }

    /// Returns the events created but not yet saved, in creation order.
    #[must_use]
    pub fn uncommitted_events(&self) -> &[Event] {
        &self.uncommitted_events
    }

    /// Empties the uncommitted buffer.
    pub fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

/// An entity whose state is derived from the events it has applied.
///
/// Implementors provide command validation and the state transition for
/// each event; identity, versioning and buffering come from the embedded
/// [`AggregateBase`].
pub trait Aggregate: Send + Sync + std::fmt::Debug {
    /// Returns the embedded base.
    fn base(&self) -> &AggregateBase;

    /// Returns the embedded base mutably.
    fn base_mut(&mut self) -> &mut AggregateBase;

    /// Validates `command` and stores the resulting events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the command is invalid or not understood by
    /// this aggregate. Nothing is stored in that case.
    fn handle_command(&mut self, command: &dyn Command) -> Result<(), DomainError>;

    /// Domain-specific state transition for one event.
    ///
    /// Must not touch the version; [`Aggregate::apply`] increments it.
    fn apply_event(&mut self, event: &Event);

    /// Returns the aggregate as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Applies `event` and increments the version exactly once.
    fn apply(&mut self, event: &Event) {
        self.apply_event(event);
        self.base_mut().increment_version();
    }

    /// Returns the aggregate type.
    fn aggregate_type(&self) -> &AggregateType {
        self.base().aggregate_type()
    }

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid {
        self.base().id()
    }

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64 {
        self.base().version()
    }

    /// Builds an event stamped with this aggregate's type, id and
    /// `version() + 1`, timestamped by the system clock.
    fn new_event(&self, event_type: EventType, data: impl EventData) -> Event
    where
        Self: Sized,
    {
        self.base().new_event(event_type, data, &SystemClock)
    }

    /// Like [`Aggregate::new_event`] but timestamped by `clock`.
    fn new_event_with_clock(
        &self,
        event_type: EventType,
        data: impl EventData,
        clock: &dyn Clock,
    ) -> Event
    where
        Self: Sized,
    {
        self.base().new_event(event_type, data, clock)
    }

    /// Appends an event to the uncommitted buffer without applying it.
    fn store_event(&mut self, event: Event) {
        self.base_mut().store_event(event);
    }

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Event] {
        self.base().uncommitted_events()
    }

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self) {
        self.base_mut().clear_uncommitted_events();
    }
}
