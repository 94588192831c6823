//! Command handling: load the target aggregate, execute, persist.

use tracing::{debug, instrument};

use crate::command::Command;
use crate::error::DomainError;
use crate::repository::Repository;

/// Routes commands to their aggregates through a [`Repository`].
///
/// Each command runs one load, handle, save cycle. No lock is held across
/// the cycle; a concurrent writer surfaces as
/// `DomainError::ConcurrencyConflict` and the caller decides whether to
/// retry.
#[derive(Debug, Clone)]
pub struct AggregateCommandHandler {
    repository: Repository,
}

impl AggregateCommandHandler {
    /// Creates a handler over `repository`.
    #[must_use]
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Handles one command.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotRegistered` for commands addressed to
    /// an unknown aggregate type, the aggregate's own validation error (in
    /// which case nothing is saved), or the repository's load/save error.
    #[instrument(
        skip_all,
        fields(
            command_type = %command.command_type(),
            aggregate_id = %command.aggregate_id(),
        )
    )]
    pub async fn handle(&self, command: &dyn Command) -> Result<(), DomainError> {
        let aggregate_type = command.aggregate_type();
        if !self
            .repository
            .registry()
            .is_aggregate_registered(&aggregate_type)
        {
            return Err(DomainError::AggregateNotRegistered(aggregate_type));
        }

        let mut aggregate = self
            .repository
            .load(&aggregate_type, command.aggregate_id())
            .await?;
        aggregate.handle_command(command)?;
        self.repository.save(aggregate.as_mut()).await?;

        debug!("command handled");
        Ok(())
    }
}
