//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{RoomRegistry, Scheduler};
use crate::lobby::LobbyService;
use crate::ws::hub::ConnectionHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub room_registry: Arc<RoomRegistry>,
    pub hub: Arc<ConnectionHub>,
    pub lobby: Arc<LobbyService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Rooms and outbound queues are shared by the lobby and the scheduler
        let room_registry = Arc::new(RoomRegistry::new());
        let hub = Arc::new(ConnectionHub::new());

        let lobby = Arc::new(LobbyService::new(room_registry.clone(), hub.clone()));

        Self {
            config,
            room_registry,
            hub,
            lobby,
        }
    }

    /// Scheduler driving this state's rooms
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.room_registry.clone(), self.hub.clone())
    }
}
