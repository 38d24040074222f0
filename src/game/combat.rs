//! Combat system - punch geometry, damage, blocking, knockback

use super::player::{Action, Facing, PlayerState};

// Stick figure proportions shared with the client renderer
pub const BODY_LENGTH: f64 = 40.0;
pub const ARM_LENGTH: f64 = 30.0;
pub const SHOULDER_DROP: f64 = 10.0;
/// Max fist-to-torso distance that counts as a hit
pub const REACH: f64 = 20.0;

/// Punch angles in radians (y grows downward)
pub const ATTACK_ANGLE_RIGHT: f64 = -0.2;
pub const ATTACK_ANGLE_LEFT: f64 = -2.94;

pub const LIGHT_DAMAGE: u32 = 8;
pub const HEAVY_DAMAGE: u32 = 18;
/// Damage multiplier against a block facing the attacker
pub const BLOCK_FACTOR: f64 = 0.4;

pub const KNOCKBACK_X: f64 = 2.0;
pub const KNOCKBACK_POP: f64 = -3.0;

/// A landed attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResult {
    pub damage: u32,
    pub blocked: bool,
    pub knocked_out: bool,
}

/// Combat system for resolving attacks between the two fighters
pub struct CombatSystem;

impl CombatSystem {
    /// Base damage for an attacking action
    pub fn base_damage(action: Action) -> Option<u32> {
        match action {
            Action::Light => Some(LIGHT_DAMAGE),
            Action::Heavy => Some(HEAVY_DAMAGE),
            Action::Idle | Action::Run | Action::Jump | Action::Block => None,
        }
    }

    /// Fist position of an attacking fighter
    pub fn fist_position(attacker: &PlayerState) -> (f64, f64) {
        let shoulder_y = attacker.y - BODY_LENGTH + SHOULDER_DROP;
        let angle = match attacker.facing {
            Facing::Right => ATTACK_ANGLE_RIGHT,
            Facing::Left => ATTACK_ANGLE_LEFT,
        };
        (
            attacker.x + angle.cos() * ARM_LENGTH,
            shoulder_y + angle.sin() * ARM_LENGTH,
        )
    }

    /// Mid-torso point an attack must reach
    pub fn hurt_target(defender: &PlayerState) -> (f64, f64) {
        (defender.x, defender.y - BODY_LENGTH / 2.0)
    }

    /// Whether the defender faces the side the attacker stands on
    pub fn is_facing(defender: &PlayerState, attacker_x: f64) -> bool {
        let attacker_on_right = attacker_x > defender.x;
        match defender.facing {
            Facing::Right => attacker_on_right,
            Facing::Left => !attacker_on_right,
        }
    }

    /// Apply block mitigation to a base damage value
    pub fn mitigate(damage: u32, blocked: bool) -> u32 {
        if blocked {
            (damage as f64 * BLOCK_FACTOR).round() as u32
        } else {
            damage
        }
    }

    /// Resolve one attacker against one defender, at most once per swing
    pub fn resolve_hit(attacker: &mut PlayerState, defender: &mut PlayerState) -> Option<HitResult> {
        if attacker.did_hit_this_action {
            return None;
        }
        let base = Self::base_damage(attacker.action)?;

        let (fx, fy) = Self::fist_position(attacker);
        let (tx, ty) = Self::hurt_target(defender);
        if (fx - tx).hypot(fy - ty) > REACH {
            return None;
        }

        let blocked = defender.action == Action::Block && Self::is_facing(defender, attacker.x);
        let damage = Self::mitigate(base, blocked);
        defender.hp = defender.hp.saturating_sub(damage);

        let direction = if attacker.x > defender.x { 1.0 } else { -1.0 };
        defender.vx += KNOCKBACK_X * direction;
        if defender.on_ground {
            defender.vy = KNOCKBACK_POP;
        }

        attacker.did_hit_this_action = true;

        Some(HitResult {
            damage,
            blocked,
            knocked_out: defender.is_down(),
        })
    }
}
