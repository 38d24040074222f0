//! Per-tick state snapshot broadcast to a room's occupants

use serde::{Deserialize, Serialize};

use super::player::{Action, Facing, PlayerState};
use super::RoomId;

/// Why the round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KoReason {
    Hp,
    Timeout,
}

/// One fighter as rendered by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub x: f64,
    pub y: f64,
    pub hp: u32,
    pub facing: Facing,
    pub action: Action,
    pub name: String,
}

impl From<&PlayerState> for PlayerSnapshot {
    fn from(p: &PlayerState) -> Self {
        Self {
            x: p.x,
            y: p.y,
            hp: p.hp,
            facing: p.facing,
            action: p.action,
            name: p.name.clone(),
        }
    }
}

/// Body of the `state` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub room: RoomId,
    pub ko: bool,
    #[serde(rename = "koReason", skip_serializing_if = "Option::is_none")]
    pub ko_reason: Option<KoReason>,
    /// Whole seconds left in the round
    pub timer: u32,
    /// Slot 1 then slot 2, occupied or not
    pub players: [PlayerSnapshot; 2],
}
