//! Unit roster: which units exist, who owns them, and where they start.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use skirmish_protocol::{Location, PlayerNumber, UnitId};

use crate::ArbiterError;

// ---------------------------------------------------------------------------
// UnitSpec
// ---------------------------------------------------------------------------

/// Static description of one unit.
///
/// Combat stats beyond health live with the client; the server only needs
/// enough to track positions, health, and when the match is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Unique identifier, also the key in snapshots.
    pub id: UnitId,

    /// The player who may move this unit.
    pub owner: PlayerNumber,

    /// Starting tile. Restored on `reset`.
    pub start: Location,

    /// Starting and maximum health. Must be positive.
    pub max_health: i32,

    /// Losing a decisive unit loses the match outright.
    pub decisive: bool,
}

impl UnitSpec {
    pub fn new(
        id: &str,
        owner: PlayerNumber,
        start: Location,
        max_health: i32,
    ) -> Self {
        Self {
            id: id.into(),
            owner,
            start,
            max_health,
            decisive: false,
        }
    }

    /// Marks the unit as decisive.
    pub fn decisive(mut self) -> Self {
        self.decisive = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// The full set of units in a match.
///
/// Validated on construction: ids are unique, health is positive, and each
/// player owns at least one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    units: Vec<UnitSpec>,
}

impl Roster {
    /// Builds a roster from unit specs.
    ///
    /// # Errors
    /// Returns [`ArbiterError::InvalidRoster`] if any of the invariants above
    /// does not hold.
    pub fn new(units: Vec<UnitSpec>) -> Result<Self, ArbiterError> {
        let mut seen = HashSet::new();
        for unit in &units {
            if !seen.insert(&unit.id) {
                return Err(ArbiterError::InvalidRoster(format!(
                    "duplicate unit id {}",
                    unit.id
                )));
            }
            if unit.max_health <= 0 {
                return Err(ArbiterError::InvalidRoster(format!(
                    "unit {} has non-positive max health {}",
                    unit.id, unit.max_health
                )));
            }
        }
        for player in PlayerNumber::ALL {
            if !units.iter().any(|u| u.owner == player) {
                return Err(ArbiterError::InvalidRoster(format!(
                    "{player} owns no units"
                )));
            }
        }
        Ok(Self { units })
    }

    /// All units, in declaration order.
    pub fn units(&self) -> &[UnitSpec] {
        &self.units
    }

    /// Looks up a unit by id.
    pub fn get(&self, id: &UnitId) -> Option<&UnitSpec> {
        self.units.iter().find(|u| &u.id == id)
    }

    /// Units owned by `player`.
    pub fn owned_by(
        &self,
        player: PlayerNumber,
    ) -> impl Iterator<Item = &UnitSpec> {
        self.units.iter().filter(move |u| u.owner == player)
    }
}

/// Three shapes per side on an 8-column board, facing each other. The
/// circles are decisive.
impl Default for Roster {
    fn default() -> Self {
        use PlayerNumber::{One, Two};
        Self {
            units: vec![
                UnitSpec::new("p1-circle", One, Location::new(0, 2), 10)
                    .decisive(),
                UnitSpec::new("p1-square", One, Location::new(0, 1), 15),
                UnitSpec::new("p1-triangle", One, Location::new(0, 3), 8),
                UnitSpec::new("p2-circle", Two, Location::new(7, 2), 10)
                    .decisive(),
                UnitSpec::new("p2-square", Two, Location::new(7, 1), 15),
                UnitSpec::new("p2-triangle", Two, Location::new(7, 3), 8),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_is_valid() {
        let roster = Roster::default();
        assert!(Roster::new(roster.units().to_vec()).is_ok());
        assert_eq!(roster.owned_by(PlayerNumber::One).count(), 3);
        assert_eq!(roster.owned_by(PlayerNumber::Two).count(), 3);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let units = vec![
            UnitSpec::new("a", PlayerNumber::One, Location::new(0, 0), 5),
            UnitSpec::new("a", PlayerNumber::Two, Location::new(1, 0), 5),
        ];
        assert!(matches!(
            Roster::new(units),
            Err(ArbiterError::InvalidRoster(_))
        ));
    }

    #[test]
    fn test_non_positive_health_rejected() {
        let units = vec![
            UnitSpec::new("a", PlayerNumber::One, Location::new(0, 0), 0),
            UnitSpec::new("b", PlayerNumber::Two, Location::new(1, 0), 5),
        ];
        assert!(Roster::new(units).is_err());
    }

    #[test]
    fn test_player_without_units_rejected() {
        let units =
            vec![UnitSpec::new("a", PlayerNumber::One, Location::new(0, 0), 5)];
        let err = Roster::new(units).unwrap_err();
        assert!(err.to_string().contains("P2 owns no units"));
    }

    #[test]
    fn test_get_finds_by_id() {
        let roster = Roster::default();
        let circle = roster.get(&"p2-circle".into()).unwrap();
        assert_eq!(circle.owner, PlayerNumber::Two);
        assert!(circle.decisive);
        assert!(roster.get(&"p3-hexagon".into()).is_none());
    }
}
