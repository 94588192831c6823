//! Commands for the user accounts context.

use std::any::Any;

use chronicle_core::command::Command;
use chronicle_core::types::{AggregateType, CommandType};
use uuid::Uuid;

use super::aggregates::USER_AGGREGATE;

/// Command type of [`CreateUser`].
pub const CREATE_USER: CommandType = CommandType::from_static("CreateUser");
/// Command type of [`RenameUser`].
pub const RENAME_USER: CommandType = CommandType::from_static("RenameUser");

/// Command to create a user account.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// The user to create.
    pub id: Uuid,
    /// The initial display name.
    pub name: String,
}

/// Command to change a user's display name.
#[derive(Debug, Clone)]
pub struct RenameUser {
    /// The user to rename.
    pub id: Uuid,
    /// The new display name.
    pub name: String,
}

impl Command for CreateUser {
    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn aggregate_type(&self) -> AggregateType {
        USER_AGGREGATE
    }

    fn command_type(&self) -> CommandType {
        CREATE_USER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Command for RenameUser {
    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn aggregate_type(&self) -> AggregateType {
        USER_AGGREGATE
    }

    fn command_type(&self) -> CommandType {
        RENAME_USER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
