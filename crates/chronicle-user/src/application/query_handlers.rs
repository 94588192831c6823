//! Query handlers for the user accounts context.
//!
//! Queries reconstitute the aggregate through the repository and return a
//! read-only view.

use chronicle_core::error::DomainError;
use chronicle_core::repository::Repository;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{USER_AGGREGATE, User};

/// Read-only view of a user aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    /// The user identifier.
    pub user_id: Uuid,
    /// Current display name.
    pub name: String,
    /// Current version (events applied).
    pub version: i64,
}

/// Retrieves a user by aggregate ID, `None` if the user was never created.
///
/// # Errors
///
/// Returns the repository's error if the stream cannot be loaded.
pub async fn get_user_by_id(
    repository: &Repository,
    user_id: Uuid,
) -> Result<Option<UserView>, DomainError> {
    let aggregate = repository.load(&USER_AGGREGATE, user_id).await?;
    let user = aggregate
        .as_any()
        .downcast_ref::<User>()
        .ok_or_else(|| {
            DomainError::Infrastructure(format!(
                "aggregate registered as {USER_AGGREGATE} is not a User"
            ))
        })?;

    if !user.is_created() {
        return Ok(None);
    }
    Ok(Some(UserView {
        user_id,
        name: user.name().to_owned(),
        version: aggregate.version(),
    }))
}
