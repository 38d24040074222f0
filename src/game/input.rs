//! Button state for one combatant

use serde::{Deserialize, Serialize};

/// Latest known button state (last write wins per field)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub light: bool,
    pub heavy: bool,
    pub block: bool,
}

impl InputState {
    /// Overwrite only the fields named in the patch
    pub fn apply(&mut self, patch: &InputPatch) {
        let fields = [
            (&mut self.left, patch.left),
            (&mut self.right, patch.right),
            (&mut self.up, patch.up),
            (&mut self.light, patch.light),
            (&mut self.heavy, patch.heavy),
            (&mut self.block, patch.block),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Either horizontal key held
    pub fn directional(&self) -> bool {
        self.left || self.right
    }
}

/// Partial input update as sent in `input.pressed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heavy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<bool>,
}
