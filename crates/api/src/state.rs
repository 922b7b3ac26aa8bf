use std::sync::Arc;

use tripcheck_events::{EventBus, Notifier};

use crate::config::ServerConfig;
use crate::storage::{LocalDiskStorage, ObjectStorage};
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tripcheck_db::DbPool,
    /// Server configuration, including the inspection policy.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager, grouped by organization.
    pub ws_manager: Arc<WsManager>,
    /// Organization event bus.
    pub event_bus: Arc<EventBus>,
    /// Fire-and-forget publisher bound to `event_bus`.
    pub notifier: Notifier,
    /// Blob store for inspection photos.
    pub storage: Arc<dyn ObjectStorage>,
}

impl AppState {
    /// Assemble state around shared infrastructure. Photos go to local disk
    /// under `config.upload_dir`.
    pub fn new(
        pool: tripcheck_db::DbPool,
        config: ServerConfig,
        ws_manager: Arc<WsManager>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let storage = Arc::new(LocalDiskStorage::new(
            &config.upload_dir,
            &config.public_base_url,
        ));
        Self {
            pool,
            config: Arc::new(config),
            ws_manager,
            notifier: Notifier::new(Arc::clone(&event_bus)),
            event_bus,
            storage,
        }
    }
}
