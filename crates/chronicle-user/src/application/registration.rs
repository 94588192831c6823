//! Type registration for the user accounts context.

use chronicle_core::aggregate::Aggregate;
use chronicle_core::error::ConfigError;
use chronicle_core::registry::TypeRegistry;

use crate::domain::aggregates::User;
use crate::domain::events::{USER_CREATED, USER_RENAMED, UserCreated, UserRenamed};

/// Registers the `User` aggregate and its event payloads.
///
/// # Errors
///
/// Returns `ConfigError::DuplicateEventType` if another context already
/// claimed one of the user event types.
pub fn register(registry: &mut TypeRegistry) -> Result<(), ConfigError> {
    registry.register_aggregate(|id| -> Box<dyn Aggregate> { Box::new(User::new(id)) })?;
    registry.register_event_data::<UserCreated>(USER_CREATED)?;
    registry.register_event_data::<UserRenamed>(USER_RENAMED)?;
    Ok(())
}
