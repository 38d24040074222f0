//! Game simulation modules

pub mod combat;
pub mod error;
pub mod input;
pub mod physics;
pub mod player;
pub mod registry;
pub mod room;
pub mod scheduler;
pub mod snapshot;

pub use error::GameError;
pub use input::{InputPatch, InputState};
pub use player::{Action, Facing, PlayerState, Slot};
pub use registry::RoomRegistry;
pub use room::Room;
pub use scheduler::Scheduler;
pub use snapshot::{KoReason, PlayerSnapshot, StateSnapshot};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for one client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Client-chosen room name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
