//! The authoritative match state and the rules that mutate it.
//!
//! `GameState` is plain data with synchronous methods. It has no locks of
//! its own; exclusive access comes from living inside the arbiter actor
//! (see `actor.rs`), which runs every operation to completion before it
//! looks at the next request.

use std::collections::BTreeMap;

use skirmish_protocol::{
    Hand, HandOutcome, Location, PerPlayer, PlayerNumber, SNAPSHOT_VERSION,
    Snapshot, Turn, TurnUpdate, UnitId,
};

use crate::{Roster, TurnRejection};

/// The player who opens every match.
pub const FIRST_PLAYER: PlayerNumber = PlayerNumber::One;

/// One match worth of mutable state.
#[derive(Debug, Clone)]
pub struct GameState {
    roster: Roster,
    active_player: PlayerNumber,
    /// Living units only.
    unit_positions: BTreeMap<UnitId, Location>,
    unit_health: BTreeMap<UnitId, i32>,
    hands: PerPlayer<Option<Hand>>,
    ready: PerPlayer<bool>,
    game_over: bool,
    pending_turn: Option<Turn>,
}

impl GameState {
    /// A fresh match: every unit at its start tile with full health.
    pub fn new(roster: Roster) -> Self {
        let unit_positions = roster
            .units()
            .iter()
            .map(|u| (u.id.clone(), u.start))
            .collect();
        let unit_health = roster
            .units()
            .iter()
            .map(|u| (u.id.clone(), u.max_health))
            .collect();
        Self {
            roster,
            active_player: FIRST_PLAYER,
            unit_positions,
            unit_health,
            hands: PerPlayer::default(),
            ready: PerPlayer::default(),
            game_over: false,
            pending_turn: None,
        }
    }

    pub fn active_player(&self) -> PlayerNumber {
        self.active_player
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// A self-contained copy suitable for sending to a peer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            active_player: self.active_player,
            unit_positions: self.unit_positions.clone(),
            unit_health: self.unit_health.clone(),
            max_health: self
                .roster
                .units()
                .iter()
                .map(|u| (u.id.clone(), u.max_health))
                .collect(),
            hands: self.hands,
            ready: self.ready,
            game_over: self.game_over,
            pending_turn: self.pending_turn.clone(),
        }
    }

    // -- Turns -----------------------------------------------------------

    /// Applies `turn` on behalf of `player`: move first, then attack, then
    /// hand the turn to the other player.
    ///
    /// The whole turn is validated before anything is written, so a
    /// rejection leaves the state exactly as it was.
    pub fn apply_turn(
        &mut self,
        turn: &Turn,
        player: PlayerNumber,
    ) -> Result<(), TurnRejection> {
        self.validate_turn(turn, player)?;

        if let Some(movement) = &turn.movement {
            self.unit_positions.insert(movement.unit.clone(), movement.to);
        }

        if let Some(attack) = &turn.attack {
            self.damage_unit(&attack.target, attack.damage);
            self.detect_game_over();
        }

        self.active_player = player.other();
        self.pending_turn = Some(turn.clone());
        Ok(())
    }

    fn validate_turn(
        &self,
        turn: &Turn,
        player: PlayerNumber,
    ) -> Result<(), TurnRejection> {
        if self.game_over {
            return Err(TurnRejection::GameOver);
        }
        if player != self.active_player {
            return Err(TurnRejection::NotYourTurn {
                active: self.active_player,
            });
        }

        if let Some(movement) = &turn.movement {
            let spec = self
                .roster
                .get(&movement.unit)
                .ok_or_else(|| TurnRejection::UnknownUnit(movement.unit.clone()))?;
            if spec.owner != player {
                return Err(TurnRejection::NotYourUnit(movement.unit.clone()));
            }
            if !self.unit_positions.contains_key(&movement.unit) {
                return Err(TurnRejection::UnitDown(movement.unit.clone()));
            }
        }

        if let Some(attack) = &turn.attack {
            if self.roster.get(&attack.target).is_none() {
                return Err(TurnRejection::UnknownUnit(attack.target.clone()));
            }
            if !self.unit_positions.contains_key(&attack.target) {
                return Err(TurnRejection::UnitDown(attack.target.clone()));
            }
        }

        Ok(())
    }

    fn damage_unit(&mut self, target: &UnitId, damage: u32) {
        let Some(health) = self.unit_health.get_mut(target) else {
            return;
        };
        let damage = i32::try_from(damage).unwrap_or(i32::MAX);
        *health = health.saturating_sub(damage);
        if *health <= 0 {
            self.unit_positions.remove(target);
            tracing::debug!(unit = %target, "unit removed");
        }
    }

    /// The match ends when a player has no living units or has lost a
    /// decisive unit. Once set, `game_over` stays set until `reset`.
    fn detect_game_over(&mut self) {
        if self.game_over {
            return;
        }
        for player in PlayerNumber::ALL {
            let mut any_alive = false;
            let mut lost_decisive = false;
            for unit in self.roster.owned_by(player) {
                let alive = self.unit_positions.contains_key(&unit.id);
                any_alive |= alive;
                lost_decisive |= unit.decisive && !alive;
            }
            if !any_alive || lost_decisive {
                self.game_over = true;
                tracing::info!(loser = %player, "game over");
                return;
            }
        }
    }

    /// The most recently completed turn, if any.
    pub fn pending_turn(&self) -> Option<&Turn> {
        self.pending_turn.as_ref()
    }

    /// Hand-off info for the peer that is waiting on the other's turn.
    pub fn turn_update(&self) -> TurnUpdate {
        TurnUpdate {
            active_player: self.active_player,
            pending_turn: self.pending_turn.clone(),
            game_over: self.game_over,
        }
    }

    // -- Hands -----------------------------------------------------------

    /// Commits `player`'s hand, replacing any earlier one.
    ///
    /// Returns the hand that was replaced. After a tie both players simply
    /// commit again.
    pub fn set_hand(&mut self, player: PlayerNumber, hand: Hand) -> Option<Hand> {
        self.hands[player].replace(hand)
    }

    /// Compares both hands. `None` until both are committed.
    ///
    /// Pure: hands stay in place, so asking twice gives the same answer.
    pub fn resolve_hands(&self) -> Option<HandOutcome> {
        let (one, two) = (self.hands.one?, self.hands.two?);
        Some(if one.beats(two) {
            HandOutcome::Winner(PlayerNumber::One)
        } else if two.beats(one) {
            HandOutcome::Winner(PlayerNumber::Two)
        } else {
            HandOutcome::Tie
        })
    }

    /// `true` iff exactly one hand is committed.
    ///
    /// Once both hands are in this is `false` again, even before anyone
    /// asks for the result: the round is then waiting on `resolve_hands`,
    /// not on a player.
    pub fn hands_pending(&self) -> bool {
        self.hands.one.is_some() != self.hands.two.is_some()
    }

    // -- Readiness -------------------------------------------------------

    pub fn set_ready(&mut self, player: PlayerNumber) {
        self.ready[player] = true;
    }

    /// `true` iff both players are ready.
    pub fn ready(&self) -> bool {
        self.ready.one && self.ready.two
    }

    /// Back to a fresh match with the same roster.
    pub fn reset(&mut self) {
        *self = Self::new(self.roster.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::Hand::{Paper, Rock, Scissors};
    use skirmish_protocol::PlayerNumber::{One, Two};

    fn state() -> GameState {
        GameState::new(Roster::default())
    }

    #[test]
    fn test_new_state_matches_roster() {
        let s = state();
        let snap = s.snapshot();
        assert_eq!(snap.active_player, One);
        assert_eq!(snap.unit_positions.len(), 6);
        assert_eq!(snap.unit_health[&"p1-square".into()], 15);
        assert_eq!(snap.max_health[&"p1-square".into()], 15);
        assert!(!snap.game_over);
        assert!(snap.pending_turn.is_none());
    }

    #[test]
    fn test_move_only_turn_updates_position_and_flips() {
        let mut s = state();
        let turn = Turn::moving("p1-square", Location::new(1, 1));
        s.apply_turn(&turn, One).unwrap();

        let snap = s.snapshot();
        assert_eq!(snap.unit_positions[&"p1-square".into()], Location::new(1, 1));
        assert_eq!(snap.active_player, Two);
        assert_eq!(s.pending_turn(), Some(&turn));
        assert!(s.pending_turn().unwrap().attack.is_none());
    }

    #[test]
    fn test_out_of_turn_is_rejected_without_change() {
        let mut s = state();
        let before = s.snapshot();
        let turn = Turn::moving("p2-square", Location::new(6, 1))
            .with_attack("p1-square", 5);

        let err = s.apply_turn(&turn, Two).unwrap_err();
        assert_eq!(err, TurnRejection::NotYourTurn { active: One });
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn test_invalid_attack_rejects_the_move_too() {
        let mut s = state();
        let before = s.snapshot();
        let turn = Turn::moving("p1-square", Location::new(2, 2))
            .with_attack("p2-dodecahedron", 3);

        assert_eq!(
            s.apply_turn(&turn, One),
            Err(TurnRejection::UnknownUnit("p2-dodecahedron".into()))
        );
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn test_cannot_move_opponent_unit() {
        let mut s = state();
        let turn = Turn::moving("p2-square", Location::new(0, 0));
        assert_eq!(
            s.apply_turn(&turn, One),
            Err(TurnRejection::NotYourUnit("p2-square".into()))
        );
    }

    #[test]
    fn test_attack_reduces_health() {
        let mut s = state();
        s.apply_turn(&Turn::default().with_attack("p2-square", 4), One)
            .unwrap();
        assert_eq!(s.snapshot().unit_health[&"p2-square".into()], 11);
        assert!(!s.is_game_over());
    }

    #[test]
    fn test_zero_damage_attack_still_counts_as_turn() {
        let mut s = state();
        s.apply_turn(&Turn::default().with_attack("p2-square", 0), One)
            .unwrap();
        assert_eq!(s.active_player(), Two);
        assert_eq!(s.snapshot().unit_health[&"p2-square".into()], 15);
    }

    #[test]
    fn test_lethal_attack_removes_position() {
        let mut s = state();
        s.apply_turn(&Turn::default().with_attack("p2-triangle", 8), One)
            .unwrap();
        let snap = s.snapshot();
        assert!(!snap.unit_positions.contains_key(&"p2-triangle".into()));
        assert_eq!(snap.unit_health[&"p2-triangle".into()], 0);
        // Triangle is not decisive and P2 has other units left.
        assert!(!snap.game_over);
    }

    #[test]
    fn test_attacking_a_downed_unit_is_rejected() {
        let mut s = state();
        s.apply_turn(&Turn::default().with_attack("p2-triangle", 99), One)
            .unwrap();
        s.apply_turn(&Turn::default(), Two).unwrap();
        assert_eq!(
            s.apply_turn(&Turn::default().with_attack("p2-triangle", 1), One),
            Err(TurnRejection::UnitDown("p2-triangle".into()))
        );
    }

    #[test]
    fn test_huge_damage_does_not_overflow() {
        let mut s = state();
        s.apply_turn(&Turn::default().with_attack("p2-square", u32::MAX), One)
            .unwrap();
        assert!(s.snapshot().unit_health[&"p2-square".into()] < 0);
    }

    #[test]
    fn test_decisive_kill_ends_game_and_blocks_turns() {
        let mut s = state();
        s.apply_turn(&Turn::default().with_attack("p2-circle", 10), One)
            .unwrap();
        assert!(s.is_game_over());
        assert_eq!(s.active_player(), Two);
        assert_eq!(
            s.apply_turn(&Turn::default(), Two),
            Err(TurnRejection::GameOver)
        );
    }

    #[test]
    fn test_hands_resolve_with_cyclic_rule() {
        let mut s = state();
        assert_eq!(s.resolve_hands(), None);
        s.set_hand(One, Rock);
        assert_eq!(s.resolve_hands(), None);
        s.set_hand(Two, Scissors);
        assert_eq!(s.resolve_hands(), Some(HandOutcome::Winner(One)));
        // Resolution is pure.
        assert_eq!(s.resolve_hands(), Some(HandOutcome::Winner(One)));
        assert_eq!(s.snapshot().hands.one, Some(Rock));
    }

    #[test]
    fn test_hands_tie() {
        let mut s = state();
        s.set_hand(One, Paper);
        s.set_hand(Two, Paper);
        assert_eq!(s.resolve_hands(), Some(HandOutcome::Tie));
    }

    #[test]
    fn test_second_hand_overwrites_the_first() {
        let mut s = state();
        assert_eq!(s.set_hand(Two, Paper), None);
        assert_eq!(s.set_hand(Two, Rock), Some(Paper));
        assert_eq!(s.snapshot().hands.two, Some(Rock));
        assert!(s.hands_pending());
    }

    #[test]
    fn test_tie_is_replayed_without_touching_the_board() {
        let mut s = state();
        s.apply_turn(&Turn::default().with_attack("p2-square", 5), One)
            .unwrap();
        s.set_hand(One, Paper);
        s.set_hand(Two, Paper);
        assert_eq!(s.resolve_hands(), Some(HandOutcome::Tie));

        s.set_hand(One, Rock);
        s.set_hand(Two, Scissors);
        assert_eq!(s.resolve_hands(), Some(HandOutcome::Winner(One)));

        let snap = s.snapshot();
        assert_eq!(snap.unit_health[&"p2-square".into()], 10);
        assert_eq!(snap.active_player, Two);
    }

    #[test]
    fn test_hands_pending_only_with_exactly_one_hand() {
        let mut s = state();
        assert!(!s.hands_pending());
        s.set_hand(One, Rock);
        assert!(s.hands_pending());
        s.set_hand(Two, Paper);
        assert!(!s.hands_pending());
    }

    #[test]
    fn test_ready_needs_both_players() {
        let mut s = state();
        assert!(!s.ready());
        s.set_ready(Two);
        assert!(!s.ready());
        s.set_ready(Two);
        assert!(!s.ready());
        s.set_ready(One);
        assert!(s.ready());
    }

    #[test]
    fn test_reset_restores_everything() {
        let mut s = state();
        let fresh = s.snapshot();
        s.set_ready(One);
        s.set_ready(Two);
        s.set_hand(One, Rock);
        s.apply_turn(
            &Turn::moving("p1-circle", Location::new(3, 3))
                .with_attack("p2-circle", 10),
            One,
        )
        .unwrap();
        assert!(s.is_game_over());

        s.reset();
        assert_eq!(s.snapshot(), fresh);
        assert!(s.apply_turn(&Turn::default(), One).is_ok());
    }
}
