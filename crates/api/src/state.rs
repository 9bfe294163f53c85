use std::sync::Arc;

use gymflow_core::{ChannelRegistry, NotificationDispatcher};
use gymflow_db::PgStore;
use tokio_util::task::TaskTracker;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and channel registry are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gymflow_db::DbPool,
    /// Server configuration, including the workflow tunables.
    pub config: Arc<ServerConfig>,
    /// Messaging channels whose credentials are configured.
    pub channels: ChannelRegistry,
    /// Dispatch runs and welcome messages, drained on shutdown.
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn store(&self) -> PgStore {
        PgStore::new(self.pool.clone())
    }

    /// A dispatcher over this state's store and channels.
    pub fn dispatcher(&self) -> NotificationDispatcher<PgStore> {
        NotificationDispatcher::new(
            self.store(),
            self.channels.clone(),
            self.config.workflow.phone_rules(),
        )
        .with_throttle(self.config.workflow.dispatch_throttle)
    }
}
