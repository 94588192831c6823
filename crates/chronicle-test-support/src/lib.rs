//! Shared test doubles for the Chronicle event-sourcing runtime.

mod bus;
mod clock;
mod store;

pub use bus::{RecordingEventBus, RecordingHandler, SubscriberLog};
pub use clock::FixedClock;
pub use store::{EmptyEventStore, FailingEventStore, RecordingEventStore};
