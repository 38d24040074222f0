//! Combatant state (authoritative)

use serde::{Deserialize, Serialize};

/// Starting and maximum hit points
pub const MAX_HP: u32 = 100;

/// Distance of each spawn point from arena center
pub const SPAWN_OFFSET_X: f64 = 120.0;

pub const DEFAULT_NAME: &str = "Player";

/// What a combatant is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Idle,
    Run,
    Jump,
    Light,
    Heavy,
    Block,
}

impl Action {
    /// Locked actions suppress directional control
    pub fn is_locked(self) -> bool {
        matches!(self, Self::Light | Self::Heavy | Self::Block)
    }

    pub fn is_attack(self) -> bool {
        matches!(self, Self::Light | Self::Heavy)
    }
}

/// Horizontal facing, serialized as -1 / 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

impl From<Facing> for i8 {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }
}

impl TryFrom<i8> for Facing {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Left),
            1 => Ok(Self::Right),
            other => Err(format!("invalid facing {}", other)),
        }
    }
}

/// One of the two seats in a room, serialized as 1 / 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::One, Slot::Two];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::One),
            1 => Some(Self::Two),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Round-start x coordinate
    pub fn spawn_x(self) -> f64 {
        match self {
            Self::One => -SPAWN_OFFSET_X,
            Self::Two => SPAWN_OFFSET_X,
        }
    }

    /// Round-start facing (toward the opponent)
    pub fn spawn_facing(self) -> Facing {
        match self {
            Self::One => Facing::Right,
            Self::Two => Facing::Left,
        }
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.number()
    }
}

impl TryFrom<u8> for Slot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("invalid slot {}", other)),
        }
    }
}

/// Player state in a room
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    // Position: x from arena center, y = 0 is ground, negative is up
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,

    pub hp: u32,
    pub facing: Facing,
    pub action: Action,
    /// Ticks left before a locked action ends
    pub action_timer: u32,
    pub on_ground: bool,
    /// Set once the current attack has connected
    pub did_hit_this_action: bool,

    pub name: String,
}

impl PlayerState {
    pub fn spawn(slot: Slot) -> Self {
        Self {
            x: slot.spawn_x(),
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            hp: MAX_HP,
            facing: slot.spawn_facing(),
            action: Action::Idle,
            action_timer: 0,
            on_ground: true,
            did_hit_this_action: false,
            name: DEFAULT_NAME.to_string(),
        }
    }

    /// Back to round-start values, keeping the display name
    pub fn reset_for_round(&mut self, slot: Slot) {
        let name = std::mem::take(&mut self.name);
        *self = Self { name, ..Self::spawn(slot) };
    }

    pub fn is_down(&self) -> bool {
        self.hp == 0
    }
}
