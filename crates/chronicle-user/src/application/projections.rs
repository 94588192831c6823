//! Read-model projection of user accounts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chronicle_core::bus::{EventBus, EventHandler};
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::events::{USER_CREATED, USER_RENAMED, UserCreated, UserRenamed};

/// One row of the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    /// The user identifier.
    pub user_id: Uuid,
    /// Current display name.
    pub name: String,
    /// Version of the last event folded into this row.
    pub version: i64,
}

/// Directory of users kept current by published user events.
///
/// Events at or below a row's version are skipped, so redelivery leaves the
/// directory unchanged.
#[derive(Debug, Default)]
pub struct UserDirectory {
    rows: RwLock<HashMap<Uuid, UserSummary>>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `directory` to the user events on `bus`.
    pub fn subscribe(directory: &Arc<Self>, bus: &dyn EventBus) {
        bus.add_handler(directory.clone(), USER_CREATED);
        bus.add_handler(directory.clone(), USER_RENAMED);
    }

    /// Returns the row for `user_id`.
    pub async fn get(&self, user_id: Uuid) -> Option<UserSummary> {
        self.rows.read().await.get(&user_id).cloned()
    }

    /// Returns every row ordered by name.
    pub async fn list(&self) -> Vec<UserSummary> {
        let mut rows: Vec<_> = self.rows.read().await.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.user_id.cmp(&b.user_id)));
        rows
    }
}

#[async_trait]
impl EventHandler for UserDirectory {
    async fn handle_event(&self, event: &Event) -> Result<(), DomainError> {
        let user_id = event.aggregate_id().ok_or_else(|| {
            DomainError::Validation(format!("event {event} is not bound to a user"))
        })?;

        let mut rows = self.rows.write().await;
        if rows
            .get(&user_id)
            .is_some_and(|row| row.version >= event.version())
        {
            debug!(%user_id, event = %event, "skipping already projected event");
            return Ok(());
        }

        if let Some(created) = event.data_as::<UserCreated>() {
            rows.insert(
                user_id,
                UserSummary {
                    user_id,
                    name: created.name.clone(),
                    version: event.version(),
                },
            );
        } else if let Some(renamed) = event.data_as::<UserRenamed>() {
            let row = rows.get_mut(&user_id).ok_or_else(|| {
                DomainError::Validation(format!("rename for unknown user {user_id}"))
            })?;
            row.name.clone_from(&renamed.name);
            row.version = event.version();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::USER_AGGREGATE;

    fn created(user_id: Uuid, name: &str) -> Event {
        Event::new(USER_CREATED, UserCreated { name: name.to_owned() })
            .for_aggregate(USER_AGGREGATE, user_id, 1)
    }

    fn renamed(user_id: Uuid, name: &str, version: i64) -> Event {
        Event::new(USER_RENAMED, UserRenamed { name: name.to_owned() })
            .for_aggregate(USER_AGGREGATE, user_id, version)
    }

    #[tokio::test]
    async fn test_user_created_adds_row() {
        // Arrange
        let directory = UserDirectory::new();
        let user_id = Uuid::new_v4();

        // Act
        directory.handle_event(&created(user_id, "Ann")).await.unwrap();

        // Assert
        assert_eq!(
            directory.get(user_id).await,
            Some(UserSummary {
                user_id,
                name: "Ann".to_owned(),
                version: 1,
            })
        );
    }

    #[tokio::test]
    async fn test_user_renamed_updates_row() {
        let directory = UserDirectory::new();
        let user_id = Uuid::new_v4();
        directory.handle_event(&created(user_id, "Ann")).await.unwrap();

        directory
            .handle_event(&renamed(user_id, "Anne", 2))
            .await
            .unwrap();

        let row = directory.get(user_id).await.unwrap();
        assert_eq!(row.name, "Anne");
        assert_eq!(row.version, 2);
    }

    #[tokio::test]
    async fn test_redelivered_event_is_skipped() {
        let directory = UserDirectory::new();
        let user_id = Uuid::new_v4();
        directory.handle_event(&created(user_id, "Ann")).await.unwrap();
        directory
            .handle_event(&renamed(user_id, "Anne", 2))
            .await
            .unwrap();

        directory.handle_event(&created(user_id, "Ann")).await.unwrap();

        assert_eq!(directory.get(user_id).await.unwrap().name, "Anne");
    }

    #[tokio::test]
    async fn test_rename_for_unknown_user_fails() {
        let directory = UserDirectory::new();
        let user_id = Uuid::new_v4();

        let result = directory.handle_event(&renamed(user_id, "Anne", 2)).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(directory.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_unbound_event_fails() {
        let directory = UserDirectory::new();

        let result = directory
            .handle_event(&Event::new(USER_CREATED, UserCreated { name: "Ann".to_owned() }))
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_orders_rows_by_name() {
        let directory = UserDirectory::new();
        directory.handle_event(&created(Uuid::new_v4(), "Cleo")).await.unwrap();
        directory.handle_event(&created(Uuid::new_v4(), "Ann")).await.unwrap();
        directory.handle_event(&created(Uuid::new_v4(), "Bob")).await.unwrap();

        let names: Vec<String> = directory.list().await.into_iter().map(|row| row.name).collect();

        assert_eq!(names, vec!["Ann", "Bob", "Cleo"]);
    }
}
