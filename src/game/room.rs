//! Room state and the fixed-step round simulation

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::util::time::{ROUND_SECONDS, TICK_RATE};

use super::combat::CombatSystem;
use super::error::GameError;
use super::input::{InputPatch, InputState};
use super::physics::PhysicsSystem;
use super::player::{PlayerState, Slot};
use super::snapshot::{KoReason, PlayerSnapshot, StateSnapshot};
use super::{ConnectionId, RoomId};

/// Round length in ticks
pub const ROUND_TICKS: u32 = ROUND_SECONDS * TICK_RATE;

/// Ticks the KO screen stays up before the next round
pub const KO_RESET_TICKS: u32 = 60;

/// A two-player match; all access goes through one lock
pub struct Room {
    id: RoomId,
    state: Mutex<RoomState>,
}

struct RoomState {
    occupants: [Option<ConnectionId>; 2],
    players: [PlayerState; 2],
    inputs: [InputState; 2],
    ko: Option<KoReason>,
    /// Ticks since the KO began
    ko_ticks: u32,
    round_timer_ticks: u32,
    #[cfg(test)]
    fail_next_tick: bool,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            state: Mutex::new(RoomState::new()),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Seat a connection in the first free slot
    pub fn join(&self, connection: ConnectionId, name: &str) -> Result<Slot, GameError> {
        let mut state = self.state.lock();

        if let Some(slot) = state.slot_of(connection) {
            return Ok(slot);
        }

        let slot = Slot::ALL
            .into_iter()
            .find(|slot| state.occupants[slot.index()].is_none())
            .ok_or(GameError::RoomFull)?;

        state.occupants[slot.index()] = Some(connection);
        state.players[slot.index()].name = name.to_string();

        info!(
            room_id = %self.id,
            connection_id = %connection,
            slot = slot.number(),
            name,
            "Player joined room"
        );

        Ok(slot)
    }

    /// Free the connection's slot, returning it if it was seated
    pub fn leave(&self, connection: ConnectionId) -> Option<Slot> {
        let mut state = self.state.lock();
        let slot = state.slot_of(connection)?;

        state.occupants[slot.index()] = None;
        state.players[slot.index()] = PlayerState::spawn(slot);
        state.inputs[slot.index()].clear();

        info!(
            room_id = %self.id,
            connection_id = %connection,
            slot = slot.number(),
            "Player left room"
        );

        Some(slot)
    }

    /// Merge a partial input update; unknown connections are ignored
    pub fn update_input(&self, connection: ConnectionId, patch: &InputPatch) -> bool {
        let mut state = self.state.lock();
        match state.slot_of(connection) {
            Some(slot) => {
                state.inputs[slot.index()].apply(patch);
                true
            }
            None => false,
        }
    }

    /// Advance the simulation by one tick
    pub fn tick(&self) -> StateSnapshot {
        self.state.lock().tick(&self.id)
    }

    /// Tick and collect the recipients under the same lock
    pub fn tick_for_broadcast(&self) -> (StateSnapshot, Vec<ConnectionId>) {
        let mut state = self.state.lock();
        let snapshot = state.tick(&self.id);
        (snapshot, state.connections())
    }

    pub fn slot_of(&self, connection: ConnectionId) -> Option<Slot> {
        self.state.lock().slot_of(connection)
    }

    /// Seated connections in slot order
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.state.lock().connections()
    }

    pub fn occupant_count(&self) -> usize {
        self.state.lock().occupants.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupant_count() == 0
    }

    /// Make the next tick panic
    #[cfg(test)]
    pub fn fail_next_tick(&self) {
        self.state.lock().fail_next_tick = true;
    }
}

impl RoomState {
    fn new() -> Self {
        Self {
            occupants: [None, None],
            players: Slot::ALL.map(PlayerState::spawn),
            inputs: [InputState::default(); 2],
            ko: None,
            ko_ticks: 0,
            round_timer_ticks: ROUND_TICKS,
            #[cfg(test)]
            fail_next_tick: false,
        }
    }

    fn slot_of(&self, connection: ConnectionId) -> Option<Slot> {
        self.occupants
            .iter()
            .position(|occupant| *occupant == Some(connection))
            .and_then(Slot::from_index)
    }

    fn connections(&self) -> Vec<ConnectionId> {
        self.occupants.iter().flatten().copied().collect()
    }

    fn tick(&mut self, room_id: &RoomId) -> StateSnapshot {
        #[cfg(test)]
        if std::mem::take(&mut self.fail_next_tick) {
            panic!("injected tick failure in room {}", room_id);
        }

        // Round timer
        if self.round_timer_ticks > 0 {
            self.round_timer_ticks -= 1;
        }
        if self.round_timer_ticks == 0 && self.ko.is_none() {
            self.knock_out(room_id, KoReason::Timeout);
        }

        // KO screen, then automatic round reset
        if self.ko.is_some() {
            self.ko_ticks += 1;
            if self.ko_ticks >= KO_RESET_TICKS {
                self.reset_round();
                info!(room_id = %room_id, "Round reset");
            }
            return self.snapshot(room_id);
        }

        for (player, input) in self.players.iter_mut().zip(&self.inputs) {
            PhysicsSystem::resolve_intent(player, input);
        }

        for (player, input) in self.players.iter_mut().zip(&self.inputs) {
            PhysicsSystem::integrate(player, input);
        }

        let [p1, p2] = &mut self.players;
        let hits = [
            (Slot::One, CombatSystem::resolve_hit(p1, p2)),
            (Slot::Two, CombatSystem::resolve_hit(p2, p1)),
        ];
        for (slot, hit) in hits {
            if let Some(hit) = hit {
                debug!(
                    room_id = %room_id,
                    attacker_slot = slot.number(),
                    damage = hit.damage,
                    blocked = hit.blocked,
                    "Hit landed"
                );
            }
        }

        for (player, input) in self.players.iter_mut().zip(&self.inputs) {
            PhysicsSystem::advance_action_timer(player, input);
        }

        if self.players.iter().any(PlayerState::is_down) {
            self.knock_out(room_id, KoReason::Hp);
        }

        self.snapshot(room_id)
    }

    fn knock_out(&mut self, room_id: &RoomId, reason: KoReason) {
        self.ko = Some(reason);
        self.ko_ticks = 0;
        info!(room_id = %room_id, reason = ?reason, "Knockout");
    }

    fn reset_round(&mut self) {
        for slot in Slot::ALL {
            self.players[slot.index()].reset_for_round(slot);
            self.inputs[slot.index()].clear();
        }
        self.ko = None;
        self.ko_ticks = 0;
        self.round_timer_ticks = ROUND_TICKS;
    }

    fn snapshot(&self, room_id: &RoomId) -> StateSnapshot {
        StateSnapshot {
            room: room_id.clone(),
            ko: self.ko.is_some(),
            ko_reason: self.ko,
            timer: self.round_timer_ticks / TICK_RATE,
            players: [
                PlayerSnapshot::from(&self.players[0]),
                PlayerSnapshot::from(&self.players[1]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::{Action, MAX_HP};

    fn room_with_two() -> (Room, ConnectionId, ConnectionId) {
        let room = Room::new(RoomId::from("r1"));
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_eq!(room.join(a, "A"), Ok(Slot::One));
        assert_eq!(room.join(b, "B"), Ok(Slot::Two));
        (room, a, b)
    }

    /// Put the fighters within punching distance of each other
    fn face_off(room: &Room) {
        let mut state = room.state.lock();
        state.players[0].x = 0.0;
        state.players[1].x = 30.0;
    }

    fn press(pressed: impl FnOnce(&mut InputPatch)) -> InputPatch {
        let mut patch = InputPatch::default();
        pressed(&mut patch);
        patch
    }

    #[test]
    fn third_join_is_rejected() {
        let (room, _, _) = room_with_two();
        assert_eq!(room.join(ConnectionId::new(), "C"), Err(GameError::RoomFull));
        assert_eq!(room.occupant_count(), 2);
    }

    #[test]
    fn rejoin_with_same_connection_keeps_slot() {
        let (room, a, b) = room_with_two();
        assert_eq!(room.join(a, "A"), Ok(Slot::One));
        assert_eq!(room.join(b, "other name"), Ok(Slot::Two));
        assert_eq!(room.occupant_count(), 2);
    }

    #[test]
    fn capacity_holds_across_leaves() {
        let (room, a, b) = room_with_two();

        assert_eq!(room.leave(a), Some(Slot::One));
        let c = ConnectionId::new();
        assert_eq!(room.join(c, "C"), Ok(Slot::One));
        assert_eq!(room.join(ConnectionId::new(), "D"), Err(GameError::RoomFull));

        room.leave(b);
        room.leave(c);
        assert!(room.is_empty());
        assert_eq!(room.leave(c), None);
    }

    #[test]
    fn leave_resets_slot_defaults() {
        let (room, a, _) = room_with_two();
        room.update_input(a, &press(|p| p.right = Some(true)));
        for _ in 0..5 {
            room.tick();
        }

        room.leave(a);

        let snapshot = room.tick();
        let p1 = &snapshot.players[0];
        assert_eq!(p1.x, -120.0);
        assert_eq!(p1.action, Action::Idle);
        assert_eq!(p1.name, "Player");
        assert_eq!(snapshot.players[1].name, "B");
    }

    #[test]
    fn input_from_stranger_is_ignored() {
        let (room, _, _) = room_with_two();
        assert!(!room.update_input(ConnectionId::new(), &press(|p| p.left = Some(true))));

        let snapshot = room.tick();
        assert_eq!(snapshot.players[0].x, -120.0);
        assert_eq!(snapshot.players[1].x, 120.0);
    }

    #[test]
    fn walking_right_advances_slot_one() {
        let (room, a, _) = room_with_two();
        room.update_input(a, &press(|p| p.right = Some(true)));

        let snapshot = room.tick();

        assert_eq!(snapshot.players[0].x, -115.0);
        assert_eq!(snapshot.players[0].action, Action::Run);
        assert_eq!(snapshot.players[1].x, 120.0);
        assert!(!snapshot.ko);
        assert_eq!(snapshot.timer, 89);
    }

    #[test]
    fn holding_left_stops_at_arena_edge() {
        let (room, a, _) = room_with_two();
        room.update_input(a, &press(|p| p.left = Some(true)));

        let mut last = room.tick();
        for _ in 0..200 {
            last = room.tick();
        }

        assert_eq!(last.players[0].x, -550.0);
    }

    #[test]
    fn one_hit_per_swing() {
        let (room, a, _) = room_with_two();
        face_off(&room);

        room.update_input(a, &press(|p| p.light = Some(true)));
        let first = room.tick();
        assert_eq!(first.players[0].action, Action::Light);
        assert_eq!(first.players[1].hp, MAX_HP - 8);

        room.update_input(a, &press(|p| p.light = Some(false)));
        let mut last = first;
        for _ in 1..10 {
            last = room.tick();
        }

        assert_eq!(last.players[1].hp, MAX_HP - 8);
        assert_eq!(last.players[0].action, Action::Idle);
    }

    #[test]
    fn slot_two_can_hit_slot_one() {
        let (room, _, b) = room_with_two();
        face_off(&room);

        room.update_input(b, &press(|p| p.heavy = Some(true)));
        let snapshot = room.tick();

        assert_eq!(snapshot.players[0].hp, MAX_HP - 18);
        assert_eq!(snapshot.players[1].hp, MAX_HP);
    }

    #[test]
    fn blocked_light_deals_three() {
        let (room, a, b) = room_with_two();
        face_off(&room);

        room.update_input(b, &press(|p| p.block = Some(true)));
        room.tick();
        {
            let mut state = room.state.lock();
            state.players[0].x = 0.0;
            state.players[1].x = 30.0;
            state.players[1].vx = 0.0;
        }

        room.update_input(a, &press(|p| p.light = Some(true)));
        let snapshot = room.tick();

        assert_eq!(snapshot.players[1].action, Action::Block);
        assert_eq!(snapshot.players[1].hp, MAX_HP - 3);
    }

    #[test]
    fn hp_stays_in_bounds_under_repeated_attacks() {
        let (room, a, b) = room_with_two();

        for tick in 0..3000u32 {
            if tick % 40 == 0 {
                face_off(&room);
            }
            let swing = tick % 2 == 0;
            room.update_input(a, &press(|p| p.light = Some(swing)));
            room.update_input(b, &press(|p| p.heavy = Some(!swing)));

            let snapshot = room.tick();
            for player in &snapshot.players {
                assert!(player.hp <= MAX_HP);
            }
        }
    }

    #[test]
    fn knockout_then_reset_after_sixty_ticks() {
        let (room, a, _) = room_with_two();
        face_off(&room);
        room.state.lock().players[1].hp = 5;

        room.update_input(a, &press(|p| p.heavy = Some(true)));
        let ko = room.tick();

        assert_eq!(ko.players[1].hp, 0);
        assert!(ko.ko);
        assert_eq!(ko.ko_reason, Some(KoReason::Hp));

        for _ in 0..KO_RESET_TICKS - 1 {
            let snapshot = room.tick();
            assert!(snapshot.ko);
            assert_eq!(snapshot.players[1].hp, 0);
        }

        let reset = room.tick();
        assert!(!reset.ko);
        assert_eq!(reset.ko_reason, None);
        assert_eq!(reset.timer, ROUND_SECONDS);
        assert_eq!(reset.players[0].x, -120.0);
        assert_eq!(reset.players[1].x, 120.0);
        assert_eq!(reset.players[1].hp, MAX_HP);
        assert_eq!(reset.players[0].action, Action::Idle);
        assert_eq!(reset.players[0].name, "A");

        // held buttons were cleared by the reset
        let next = room.tick();
        assert_eq!(next.players[0].action, Action::Idle);
    }

    #[test]
    fn round_timer_expiry_is_a_timeout_knockout() {
        let (room, _, _) = room_with_two();

        for _ in 0..ROUND_TICKS - 1 {
            assert!(!room.tick().ko);
        }

        let timeout = room.tick();
        assert!(timeout.ko);
        assert_eq!(timeout.ko_reason, Some(KoReason::Timeout));
        assert_eq!(timeout.timer, 0);

        for _ in 0..KO_RESET_TICKS - 2 {
            assert!(room.tick().ko);
        }
        let reset = room.tick();
        assert!(!reset.ko);
        assert_eq!(reset.timer, ROUND_SECONDS);
    }

    #[test]
    fn empty_room_still_ticks() {
        let room = Room::new(RoomId::from("solo"));
        let (snapshot, recipients) = room.tick_for_broadcast();
        assert!(recipients.is_empty());
        assert_eq!(snapshot.room.as_str(), "solo");
        assert_eq!(snapshot.players[0].name, "Player");
    }
}
