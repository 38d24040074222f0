//! Fighter movement, jumping and action state transitions

use super::input::InputState;
use super::player::{Action, Facing, PlayerState};

/// Downward acceleration per tick
pub const GRAVITY: f64 = 0.8;
/// Initial upward speed of a jump
pub const JUMP_POWER: f64 = 17.0;
/// Horizontal speed while a direction is held
pub const WALK_SPEED: f64 = 5.0;
/// Grounded friction applied after integration
pub const GROUND_FRICTION: f64 = 0.8;
/// Decay when no direction is held
pub const RELEASE_DECAY: f64 = 0.8;
/// Decay while committed to a locked action
pub const LOCKED_DECAY: f64 = 0.9;

pub const ARENA_HALF_WIDTH: f64 = 600.0;
pub const LEFT_BOUND: f64 = -ARENA_HALF_WIDTH + 50.0;
pub const RIGHT_BOUND: f64 = ARENA_HALF_WIDTH - 50.0;

/// Action durations in ticks
pub const LIGHT_TICKS: u32 = 10;
pub const HEAVY_TICKS: u32 = 18;
pub const BLOCK_TICKS: u32 = 14;

/// Physics system for moving fighters and driving their action state
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Turn held buttons into velocity, facing and action changes
    pub fn resolve_intent(player: &mut PlayerState, input: &InputState) {
        let locked = player.action.is_locked();

        if locked {
            player.vx *= LOCKED_DECAY;
        } else if input.left {
            Self::walk(player, Facing::Left);
        } else if input.right {
            Self::walk(player, Facing::Right);
        } else {
            player.vx *= RELEASE_DECAY;
            if player.on_ground && player.action == Action::Run {
                player.action = Action::Idle;
            }
        }

        if input.up && player.on_ground && !locked {
            player.vy = -JUMP_POWER;
            player.on_ground = false;
            player.action = Action::Jump;
        }

        if input.light && player.on_ground && player.action_timer == 0 {
            Self::start_attack(player, Action::Light, LIGHT_TICKS);
        }
        if input.heavy && player.on_ground && player.action_timer == 0 {
            Self::start_attack(player, Action::Heavy, HEAVY_TICKS);
        }

        if input.block && player.on_ground && player.action != Action::Block {
            player.action = Action::Block;
            player.action_timer = BLOCK_TICKS;
        }
        if !input.block && player.action == Action::Block {
            player.action_timer = 0;
            player.action = Self::settled_action(player, input);
        }
    }

    /// Gravity, integration, ground and wall collision, friction
    pub fn integrate(player: &mut PlayerState, input: &InputState) {
        player.vy += GRAVITY;
        player.x += player.vx;
        player.y += player.vy;

        if player.y >= 0.0 {
            player.y = 0.0;
            player.vy = 0.0;
            player.on_ground = true;
            if !player.action.is_locked() && !input.directional() {
                player.action = Action::Idle;
            }
        } else {
            player.on_ground = false;
        }

        player.x = player.x.clamp(LEFT_BOUND, RIGHT_BOUND);

        if player.on_ground {
            player.vx *= GROUND_FRICTION;
        }
    }

    /// Count down the current action and release it when done
    pub fn advance_action_timer(player: &mut PlayerState, input: &InputState) {
        if player.action_timer == 0 {
            return;
        }
        player.action_timer -= 1;
        if player.action_timer == 0 && player.action != Action::Jump {
            player.action = Self::settled_action(player, input);
        }
    }

    fn walk(player: &mut PlayerState, facing: Facing) {
        player.vx = WALK_SPEED * facing.sign();
        player.facing = facing;
        if player.on_ground && player.action != Action::Jump {
            player.action = Action::Run;
        }
    }

    fn start_attack(player: &mut PlayerState, action: Action, ticks: u32) {
        player.action = action;
        player.action_timer = ticks;
        player.did_hit_this_action = false;
    }

    /// Action to fall back to when a locked action ends
    fn settled_action(player: &PlayerState, input: &InputState) -> Action {
        if player.on_ground && input.directional() {
            Action::Run
        } else {
            Action::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::Slot;

    fn step(player: &mut PlayerState, input: &InputState) {
        PhysicsSystem::resolve_intent(player, input);
        PhysicsSystem::integrate(player, input);
        PhysicsSystem::advance_action_timer(player, input);
    }

    #[test]
    fn walking_right_moves_then_applies_friction() {
        let mut p = PlayerState::spawn(Slot::One);
        let input = InputState {
            right: true,
            ..Default::default()
        };

        step(&mut p, &input);

        assert_eq!(p.x, -115.0);
        assert_eq!(p.vx, WALK_SPEED * GROUND_FRICTION);
        assert_eq!(p.action, Action::Run);
        assert_eq!(p.facing, Facing::Right);
        assert!(p.on_ground);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn releasing_direction_returns_to_idle() {
        let mut p = PlayerState::spawn(Slot::One);
        step(
            &mut p,
            &InputState {
                left: true,
                ..Default::default()
            },
        );
        assert_eq!(p.action, Action::Run);

        step(&mut p, &InputState::default());
        assert_eq!(p.action, Action::Idle);
        assert!(p.vx.abs() < WALK_SPEED);
    }

    #[test]
    fn holding_left_clamps_at_left_bound() {
        let mut p = PlayerState::spawn(Slot::One);
        let input = InputState {
            left: true,
            ..Default::default()
        };

        for _ in 0..500 {
            step(&mut p, &input);
            assert!(p.x >= LEFT_BOUND);
        }

        assert_eq!(p.x, -550.0);
    }

    #[test]
    fn jump_leaves_ground_and_lands() {
        let mut p = PlayerState::spawn(Slot::Two);
        let jump = InputState {
            up: true,
            ..Default::default()
        };

        step(&mut p, &jump);
        assert_eq!(p.action, Action::Jump);
        assert!(!p.on_ground);
        assert!(p.y < 0.0);

        let mut ticks = 1;
        while !p.on_ground {
            step(&mut p, &InputState::default());
            ticks += 1;
            assert!(ticks < 100, "never landed");
        }

        assert_eq!(p.y, 0.0);
        assert_eq!(p.vy, 0.0);
        assert_eq!(p.action, Action::Idle);
    }

    #[test]
    fn attack_locks_movement_until_timer_expires() {
        let mut p = PlayerState::spawn(Slot::One);
        let attack = InputState {
            light: true,
            right: true,
            ..Default::default()
        };

        PhysicsSystem::resolve_intent(&mut p, &attack);
        assert_eq!(p.action, Action::Light);
        assert_eq!(p.action_timer, LIGHT_TICKS);

        let hold_right = InputState {
            right: true,
            ..Default::default()
        };
        for _ in 0..LIGHT_TICKS - 1 {
            PhysicsSystem::integrate(&mut p, &hold_right);
            PhysicsSystem::advance_action_timer(&mut p, &hold_right);
            assert_eq!(p.action, Action::Light);
            PhysicsSystem::resolve_intent(&mut p, &hold_right);
        }
        PhysicsSystem::integrate(&mut p, &hold_right);
        PhysicsSystem::advance_action_timer(&mut p, &hold_right);

        assert_eq!(p.action_timer, 0);
        assert_eq!(p.action, Action::Run);
    }

    #[test]
    fn locked_action_decays_velocity() {
        let mut p = PlayerState::spawn(Slot::One);
        p.vx = 4.0;
        p.action = Action::Heavy;
        p.action_timer = 5;

        PhysicsSystem::resolve_intent(
            &mut p,
            &InputState {
                left: true,
                ..Default::default()
            },
        );

        assert!((p.vx - 3.6).abs() < 1e-9);
        assert_eq!(p.facing, Facing::Right);
    }

    #[test]
    fn releasing_block_ends_it_immediately() {
        let mut p = PlayerState::spawn(Slot::One);
        let block = InputState {
            block: true,
            ..Default::default()
        };

        PhysicsSystem::resolve_intent(&mut p, &block);
        assert_eq!(p.action, Action::Block);
        assert_eq!(p.action_timer, BLOCK_TICKS);

        let released = InputState {
            left: true,
            ..Default::default()
        };
        PhysicsSystem::resolve_intent(&mut p, &released);
        assert_eq!(p.action, Action::Run);
        assert_eq!(p.action_timer, 0);
    }

    #[test]
    fn cannot_attack_while_airborne() {
        let mut p = PlayerState::spawn(Slot::One);
        p.on_ground = false;
        p.y = -40.0;

        PhysicsSystem::resolve_intent(
            &mut p,
            &InputState {
                heavy: true,
                ..Default::default()
            },
        );

        assert_eq!(p.action, Action::Idle);
        assert_eq!(p.action_timer, 0);
    }
}
