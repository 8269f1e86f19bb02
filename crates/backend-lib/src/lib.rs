// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Room coordination and playlist engine for the watch-party server.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod permissions;
pub mod playlist;
pub mod provider;
pub mod reconcile;
pub mod room_lock;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::config::Settings;
use crate::coordinator::RoomCoordinator;
use crate::provider::PlaylistProvider;
use crate::storage::{FlatFileStorage, MemoryRegistry};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Room operations over both storage tiers
    pub coordinator: RoomCoordinator,
    /// Settings the server was started with
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(coordinator: RoomCoordinator, settings: Settings) -> Self {
        Self {
            coordinator,
            settings: Arc::new(settings),
        }
    }

    /// Wire the default tiers: in-memory live rooms, flat files for records
    pub fn with_storage(
        registry: MemoryRegistry,
        storage: FlatFileStorage,
        provider: Arc<dyn PlaylistProvider>,
        settings: Settings,
    ) -> Self {
        let storage = Arc::new(storage);
        let coordinator = RoomCoordinator::new(
            Arc::new(registry),
            storage.clone(),
            storage,
            provider,
        )
        .with_provider_timeout(settings.provider.timeout());
        Self::new(coordinator, settings)
    }
}
