//! The demo scenario: create a user, read it back through the repository
//! and through the read model.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chronicle_core::bus::{EventBus, EventObserver};
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::handler::AggregateCommandHandler;
use chronicle_core::registry::TypeRegistry;
use chronicle_core::repository::Repository;
use chronicle_event_store::memory_event_store::MemoryEventStore;
use chronicle_eventbus::local::LocalEventBus;
use chronicle_user::application::projections::{UserDirectory, UserSummary};
use chronicle_user::application::query_handlers::{UserView, get_user_by_id};
use chronicle_user::application::registration;
use chronicle_user::domain::commands::CreateUser;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::DemoConfig;
use crate::error::AppError;

/// Outcome of one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// The user created by the scenario.
    pub user_id: Uuid,
    /// The user as rebuilt from its event stream.
    pub view: UserView,
    /// The read model after every published event was handled.
    pub directory: Vec<UserSummary>,
    /// Number of events seen by the bus observer.
    pub published: usize,
}

/// Observer that logs every published event and counts them.
#[derive(Debug, Default)]
struct EventLogger {
    seen: AtomicUsize,
}

#[async_trait]
impl EventObserver for EventLogger {
    async fn notify(&self, event: &Event) -> Result<(), DomainError> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        info!(
            event = %event,
            aggregate_id = ?event.aggregate_id(),
            timestamp = %event.timestamp(),
            "event published"
        );
        Ok(())
    }
}

/// Builds the runtime from `config` and runs the scenario.
///
/// # Errors
///
/// Returns `AppError::Registry` if type registration fails and
/// `AppError::Domain` if a command or query fails.
#[instrument(skip_all, fields(strategy = %config.strategy))]
pub async fn run(config: &DemoConfig) -> Result<ScenarioReport, AppError> {
    let mut registry = TypeRegistry::new();
    registration::register(&mut registry)?;
    let registry = Arc::new(registry);

    let store = Arc::new(MemoryEventStore::new(registry.clone()));
    let bus = Arc::new(LocalEventBus::with_strategy(config.strategy));
    let directory = Arc::new(UserDirectory::new());
    let logger = Arc::new(EventLogger::default());
    UserDirectory::subscribe(&directory, bus.as_ref());
    bus.add_observer(logger.clone());

    let repository = Repository::new(registry, store).with_event_bus(bus.clone());
    let handler = AggregateCommandHandler::new(repository.clone());

    let user_id = Uuid::now_v7();
    handler
        .handle(&CreateUser {
            id: user_id,
            name: config.user_name.clone(),
        })
        .await?;
    bus.drain().await;

    let view = get_user_by_id(&repository, user_id).await?.ok_or_else(|| {
        DomainError::Infrastructure(format!("user {user_id} missing after creation"))
    })?;
    let report = ScenarioReport {
        user_id,
        view,
        directory: directory.list().await,
        published: logger.seen.load(Ordering::Relaxed),
    };

    info!(
        %user_id,
        name = %report.view.name,
        version = report.view.version,
        directory_rows = report.directory.len(),
        published = report.published,
        "scenario complete"
    );
    Ok(report)
}
