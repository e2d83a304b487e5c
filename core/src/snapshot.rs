//! Serializable views of the world shared with remote agents and renderers.

use serde::{Deserialize, Serialize};

use crate::{Affiliation, Camp, EntityId, Order, Position, Rank, RosterEntry, Winner};

/// Occupants seen on one swept position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    /// Swept position.
    pub position: Position,
    /// Entities standing on the position.
    pub entities: Vec<EntityId>,
}

/// Result of a telescope sweep: every occupied position along the commander's
/// row and column, in position order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    sightings: Vec<Sighting>,
}

impl Observation {
    /// Creates an observation from raw sightings, dropping empty ones.
    #[must_use]
    pub fn from_sightings(mut sightings: Vec<Sighting>) -> Self {
        sightings.retain(|sighting| !sighting.entities.is_empty());
        sightings.sort_by_key(|sighting| sighting.position);
        Self { sightings }
    }

    /// Iterator over the sightings in position order.
    pub fn iter(&self) -> impl Iterator<Item = &Sighting> {
        self.sightings.iter()
    }

    /// Entities seen at the provided position.
    #[must_use]
    pub fn entities_at(&self, position: Position) -> &[EntityId] {
        self.sightings
            .binary_search_by_key(&position, |sighting| sighting.position)
            .map_or(&[], |index| self.sightings[index].entities.as_slice())
    }

    /// Reports whether the entity was seen anywhere in the sweep.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.sightings
            .iter()
            .any(|sighting| sighting.entities.contains(&entity))
    }

    /// Number of occupied positions seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    /// Reports whether nothing was seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }
}

/// Snapshot of one commander.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommanderSnapshot {
    /// Entity on the grid.
    pub entity: EntityId,
    /// Authoritative position.
    pub position: Position,
    /// Position cached by the last compass reading, if any.
    pub last_position: Option<Position>,
    /// Observation cached by the last telescope sweep, if any.
    pub observation: Option<Observation>,
}

/// Snapshot of one subordinate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubordinateSnapshot {
    /// Entity on the grid.
    pub entity: EntityId,
    /// Squad-local identifier.
    pub identifier: u32,
    /// Authoritative position.
    pub position: Position,
    /// Last heard order that has not been acted upon yet.
    pub direction: Order,
}

/// Snapshot of one squad.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadSnapshot {
    /// Team of the squad.
    pub camp: Camp,
    /// The squad's commander.
    pub commander: CommanderSnapshot,
    /// The squad's subordinates ordered by identifier.
    pub subordinates: Vec<SubordinateSnapshot>,
}

/// Full game state sent to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Squads in roster order.
    pub squads: Vec<SquadSnapshot>,
    /// Whether any commander is tagged.
    pub done: bool,
    /// Verdict once the game is done.
    pub winner: Option<Winner>,
}

impl GameSnapshot {
    /// Squad of the provided camp.
    #[must_use]
    pub fn squad(&self, camp: Camp) -> Option<&SquadSnapshot> {
        self.squads.iter().find(|squad| squad.camp == camp)
    }

    /// Flattened roster in slot order.
    #[must_use]
    pub fn roster(&self) -> Vec<RosterEntry> {
        let mut roster = Vec::new();
        for squad in &self.squads {
            roster.push(RosterEntry {
                camp: squad.camp,
                rank: Rank::Commander,
                identifier: None,
                entity: squad.commander.entity,
            });
            roster.extend(squad.subordinates.iter().map(|subordinate| RosterEntry {
                camp: squad.camp,
                rank: Rank::Subordinate,
                identifier: Some(subordinate.identifier),
                entity: subordinate.entity,
            }));
        }
        roster
    }

    /// Camp and rank of any soldier in the game.
    #[must_use]
    pub fn affiliation_of(&self, entity: EntityId) -> Option<Affiliation> {
        self.squads.iter().find_map(|squad| {
            if squad.commander.entity == entity {
                Some(Affiliation::new(squad.camp, Rank::Commander))
            } else if squad.subordinates.iter().any(|s| s.entity == entity) {
                Some(Affiliation::new(squad.camp, Rank::Subordinate))
            } else {
                None
            }
        })
    }

    /// Authoritative position of any soldier in the game.
    #[must_use]
    pub fn position_of(&self, entity: EntityId) -> Option<Position> {
        self.squads.iter().find_map(|squad| {
            if squad.commander.entity == entity {
                return Some(squad.commander.position);
            }
            squad
                .subordinates
                .iter()
                .find(|subordinate| subordinate.entity == entity)
                .map(|subordinate| subordinate.position)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_drops_empty_sightings_and_sorts() {
        let observation = Observation::from_sightings(vec![
            Sighting {
                position: Position::new(3, 1),
                entities: vec![EntityId::new(4)],
            },
            Sighting {
                position: Position::new(0, 1),
                entities: Vec::new(),
            },
            Sighting {
                position: Position::new(1, 1),
                entities: vec![EntityId::new(0), EntityId::new(7)],
            },
        ]);

        assert_eq!(observation.len(), 2);
        let positions: Vec<_> = observation.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![Position::new(1, 1), Position::new(3, 1)]);
        assert_eq!(
            observation.entities_at(Position::new(1, 1)),
            &[EntityId::new(0), EntityId::new(7)]
        );
        assert!(observation.entities_at(Position::new(0, 1)).is_empty());
        assert!(observation.contains(EntityId::new(4)));
    }
}
