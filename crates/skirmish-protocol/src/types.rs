//! Payload types that travel on the wire.
//!
//! Commands themselves are bare names (see [`Command`](crate::Command));
//! everything a command carries or returns is one of the types below,
//! encoded by a [`Codec`](crate::Codec). Every type has a fixed, named
//! shape so the decoder never has to guess what it is looking at.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Schema version stamped into every [`Snapshot`].
///
/// Bump this whenever a field is added, removed, or changes meaning.
pub const SNAPSHOT_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Which of the two seats a peer occupies.
///
/// On the wire this is the plain integer `1` or `2`, which is also what the
/// server sends as its greeting when a peer connects. Any other integer
/// fails to decode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerNumber {
    /// The first seat. Player one always opens the match.
    One,
    /// The second seat.
    Two,
}

impl PlayerNumber {
    /// Both seats, in order.
    pub const ALL: [PlayerNumber; 2] = [PlayerNumber::One, PlayerNumber::Two];

    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl From<PlayerNumber> for u8 {
    fn from(player: PlayerNumber) -> u8 {
        match player {
            PlayerNumber::One => 1,
            PlayerNumber::Two => 2,
        }
    }
}

impl TryFrom<u8> for PlayerNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("player number must be 1 or 2, got {other}")),
        }
    }
}

impl fmt::Display for PlayerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", u8::from(*self))
    }
}

/// Identifies one unit on the board, e.g. `"p1-circle"`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    /// Borrows the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A board tile, addressed by column and row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Location {
    pub col: u16,
    pub row: u16,
}

impl Location {
    pub fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

// ---------------------------------------------------------------------------
// PerPlayer: one value per seat
// ---------------------------------------------------------------------------

/// A pair of values, one per seat, indexable by [`PlayerNumber`].
///
/// Encodes as `{ "one": .., "two": .. }`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct PerPlayer<T> {
    pub one: T,
    pub two: T,
}

impl<T> PerPlayer<T> {
    /// Iterates over `(seat, value)` pairs, player one first.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerNumber, &T)> {
        [(PlayerNumber::One, &self.one), (PlayerNumber::Two, &self.two)]
            .into_iter()
    }
}

impl<T> Index<PlayerNumber> for PerPlayer<T> {
    type Output = T;

    fn index(&self, player: PlayerNumber) -> &T {
        match player {
            PlayerNumber::One => &self.one,
            PlayerNumber::Two => &self.two,
        }
    }
}

impl<T> IndexMut<PlayerNumber> for PerPlayer<T> {
    fn index_mut(&mut self, player: PlayerNumber) -> &mut T {
        match player {
            PlayerNumber::One => &mut self.one,
            PlayerNumber::Two => &mut self.two,
        }
    }
}

// ---------------------------------------------------------------------------
// Turn payload
// ---------------------------------------------------------------------------

/// Relocates one of the acting player's units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub unit: UnitId,
    pub to: Location,
}

/// Deals damage to a unit.
///
/// `damage` may legitimately be zero; the turn still counts as containing
/// an attack, and game-over detection still runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub target: UnitId,
    pub damage: u32,
}

/// One player's complete action for a turn.
///
/// The server applies `move` first, then `attack`, as one atomic step.
/// Either part may be absent; a turn with neither simply passes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Turn {
    #[serde(rename = "move", default)]
    pub movement: Option<Move>,
    #[serde(default)]
    pub attack: Option<Attack>,
    /// Client-side phase marker. Carried along so peers can mirror it; the
    /// server never interprets it.
    #[serde(default)]
    pub phase: u8,
}

impl Turn {
    /// A turn that only moves.
    pub fn moving(unit: impl Into<UnitId>, to: Location) -> Self {
        Self {
            movement: Some(Move {
                unit: unit.into(),
                to,
            }),
            ..Self::default()
        }
    }

    /// Adds an attack to this turn.
    pub fn with_attack(mut self, target: impl Into<UnitId>, damage: u32) -> Self {
        self.attack = Some(Attack {
            target: target.into(),
            damage,
        });
        self
    }
}

// ---------------------------------------------------------------------------
// Hands (tie-break sub-protocol)
// ---------------------------------------------------------------------------

/// A committed tie-break hand. Integer on the wire: 0, 1, or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    /// Cyclic dominance: rock beats scissors, scissors beats paper,
    /// paper beats rock.
    pub fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors)
                | (Hand::Scissors, Hand::Paper)
                | (Hand::Paper, Hand::Rock)
        )
    }
}

impl From<Hand> for u8 {
    fn from(hand: Hand) -> u8 {
        match hand {
            Hand::Rock => 0,
            Hand::Paper => 1,
            Hand::Scissors => 2,
        }
    }
}

impl TryFrom<u8> for Hand {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Hand::Rock),
            1 => Ok(Hand::Paper),
            2 => Ok(Hand::Scissors),
            other => Err(format!("hand must be 0, 1 or 2, got {other}")),
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Hand::Rock => "rock",
            Hand::Paper => "paper",
            Hand::Scissors => "scissors",
        })
    }
}

/// Result of comparing both committed hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandOutcome {
    Winner(PlayerNumber),
    Tie,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Acknowledgement frame.
///
/// `Rejected` is how the server reports a refused operation (out of turn,
/// game already over, hand already committed) without closing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ack {
    Ok,
    Rejected { reason: String },
}

impl Ack {
    pub fn rejected(reason: impl fmt::Display) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Ack::Ok)
    }
}

/// Turn hand-off information for the waiting peer.
///
/// Answers both "whose turn is it now" and "what did the last turn do",
/// so the waiting peer can replay the effects locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnUpdate {
    pub active_player: PlayerNumber,
    pub pending_turn: Option<Turn>,
    pub game_over: bool,
}

/// A complete, self-consistent copy of the match state.
///
/// Maps are `BTreeMap` so the encoding is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u16,
    pub active_player: PlayerNumber,
    /// Living units only. A unit whose health dropped to zero or below has
    /// no entry here.
    pub unit_positions: BTreeMap<UnitId, Location>,
    pub unit_health: BTreeMap<UnitId, i32>,
    pub max_health: BTreeMap<UnitId, i32>,
    pub hands: PerPlayer<Option<Hand>>,
    pub ready: PerPlayer<bool>,
    pub game_over: bool,
    pub pending_turn: Option<Turn>,
}

impl Snapshot {
    /// `true` if `player` holds the turn.
    pub fn is_players_turn(&self, player: PlayerNumber) -> bool {
        self.active_player == player
    }

    /// `true` once both seats have sent `start`.
    pub fn ready(&self) -> bool {
        self.ready.one && self.ready.two
    }

    /// Fails if the snapshot was written by a different schema version.
    pub fn check_version(&self) -> Result<(), ProtocolError> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(ProtocolError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            })
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
