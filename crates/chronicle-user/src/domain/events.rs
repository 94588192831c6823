//! Domain events for the user accounts context.

use chronicle_core::types::EventType;
use serde::{Deserialize, Serialize};

/// Event type of [`UserCreated`].
pub const USER_CREATED: EventType = EventType::from_static("UserCreated");
/// Event type of [`UserRenamed`].
pub const USER_RENAMED: EventType = EventType::from_static("UserRenamed");

/// Emitted when a user account is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    /// The initial display name.
    pub name: String,
}

/// Emitted when a user changes their display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRenamed {
    /// The new display name.
    pub name: String,
}
