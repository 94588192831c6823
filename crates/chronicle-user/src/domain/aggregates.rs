//! Aggregate roots for the user accounts context.

use std::any::Any;

use chronicle_core::aggregate::{Aggregate, AggregateBase};
use chronicle_core::command::Command;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::types::AggregateType;
use uuid::Uuid;

use super::commands::{CreateUser, RenameUser};
use super::events::{USER_CREATED, USER_RENAMED, UserCreated, UserRenamed};

/// Aggregate type of [`User`].
pub const USER_AGGREGATE: AggregateType = AggregateType::from_static("User");

/// The aggregate root for a user account.
#[derive(Debug)]
pub struct User {
    base: AggregateBase,
    /// Whether `UserCreated` has been applied.
    pub(crate) created: bool,
    /// Current display name.
    pub(crate) name: String,
}

impl User {
    /// Creates an empty user that has not applied any event yet.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            base: AggregateBase::new(USER_AGGREGATE, id),
            created: false,
            name: String::new(),
        }
    }

    /// Returns whether the account exists.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Returns the current display name, empty before creation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn create(&mut self, command: &CreateUser) -> Result<(), DomainError> {
        if self.created {
            return Err(DomainError::Validation(format!(
                "user {} already exists",
                self.aggregate_id()
            )));
        }
        let name = validated_name(&command.name)?;
        let event = self.new_event(USER_CREATED, UserCreated { name });
        self.store_event(event);
        Ok(())
    }

    fn rename(&mut self, command: &RenameUser) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::Validation(format!(
                "user {} does not exist",
                self.aggregate_id()
            )));
        }
        let name = validated_name(&command.name)?;
        if name == self.name {
            return Ok(());
        }
        let event = self.new_event(USER_RENAMED, UserRenamed { name });
        self.store_event(event);
        Ok(())
    }
}

fn validated_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("user name must not be empty".into()));
    }
    Ok(name.to_owned())
}

impl Aggregate for User {
    fn base(&self) -> &AggregateBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AggregateBase {
        &mut self.base
    }

    fn handle_command(&mut self, command: &dyn Command) -> Result<(), DomainError> {
        if let Some(create) = command.downcast_ref::<CreateUser>() {
            return self.create(create);
        }
        if let Some(rename) = command.downcast_ref::<RenameUser>() {
            return self.rename(rename);
        }
        Err(DomainError::UnhandledCommand {
            aggregate_type: USER_AGGREGATE,
            command_type: command.command_type(),
        })
    }

    fn apply_event(&mut self, event: &Event) {
        if let Some(created) = event.data_as::<UserCreated>() {
            self.created = true;
            self.name.clone_from(&created.name);
        } else if let Some(renamed) = event.data_as::<UserRenamed>() {
            self.name.clone_from(&renamed.name);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
