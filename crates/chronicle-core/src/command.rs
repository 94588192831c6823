//! Command abstractions.

use std::any::Any;

use uuid::Uuid;

use crate::types::{AggregateType, CommandType};

/// A request to change the state of one aggregate instance.
///
/// Commands are stateless and never persisted; the target aggregate
/// validates them and turns them into zero or more events.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The aggregate instance the command targets.
    fn aggregate_id(&self) -> Uuid;

    /// The aggregate type the command targets.
    fn aggregate_type(&self) -> AggregateType;

    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> CommandType;

    /// Returns the command as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Command + '_ {
    /// Returns the concrete command if it is a `C`.
    #[must_use]
    pub fn downcast_ref<C: Command + 'static>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }
}
