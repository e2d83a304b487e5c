//! Per-agent observation records and rewards derived from a snapshot.

use runtag_core::{Camp, GameSnapshot, Position, Rank, SquadSnapshot};
use serde::{Deserialize, Serialize};

use crate::encoding::direction_index;

/// What a commander knows: its cached position and the occupancy seen by its
/// last telescope sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommanderObservation {
    /// Camp of the commander.
    pub camp: Camp,
    /// Roster index of the camp: `0` blue, `1` red.
    pub team: usize,
    /// Cached position, `(0, 0)` before the first reading.
    pub position: Position,
    /// `height × width` grid: `+1` friendly commander, `-1` enemy, `0` unseen.
    pub commanders: Vec<Vec<i8>>,
    /// `height × width` grid: `+1` friendly subordinate, `-1` enemy, `0` unseen.
    pub subordinates: Vec<Vec<i8>>,
}

/// What a subordinate knows: who it is and the last order it heard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubordinateObservation {
    /// Camp of the subordinate.
    pub camp: Camp,
    /// Roster index of the camp: `0` blue, `1` red.
    pub team: usize,
    /// Squad-local identifier.
    pub identifier: u32,
    /// Index of the pending order in the direction table, `0` when none.
    pub direction: usize,
}

/// Observation of one roster slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rank", rename_all = "lowercase")]
pub enum AgentObservation {
    /// Slot held by a commander.
    Commander(CommanderObservation),
    /// Slot held by a subordinate.
    Subordinate(SubordinateObservation),
}

/// One observation per roster slot, in slot order.
#[must_use]
pub fn observations(snapshot: &GameSnapshot) -> Vec<AgentObservation> {
    let mut records = Vec::new();
    for squad in &snapshot.squads {
        records.push(AgentObservation::Commander(commander_observation(
            snapshot, squad,
        )));
        records.extend(squad.subordinates.iter().map(|subordinate| {
            AgentObservation::Subordinate(SubordinateObservation {
                camp: squad.camp,
                team: squad.camp.index(),
                identifier: subordinate.identifier,
                direction: direction_index(subordinate.direction),
            })
        }));
    }
    records
}

/// One reward per roster slot, in slot order.
///
/// A commander is rewarded with the negated sum of its distances to every
/// enemy subordinate, a subordinate with the negated sum of its distances to
/// every enemy commander.
#[must_use]
pub fn rewards(snapshot: &GameSnapshot) -> Vec<i64> {
    let mut rewards = Vec::new();
    for squad in &snapshot.squads {
        let enemies = snapshot
            .squads
            .iter()
            .filter(|other| other.camp != squad.camp);

        let hunters = enemies
            .clone()
            .flat_map(|enemy| enemy.subordinates.iter().map(|s| s.position));
        rewards.push(-distance_sum(squad.commander.position, hunters));

        for subordinate in &squad.subordinates {
            let targets = enemies.clone().map(|enemy| enemy.commander.position);
            rewards.push(-distance_sum(subordinate.position, targets));
        }
    }
    rewards
}

fn commander_observation(snapshot: &GameSnapshot, squad: &SquadSnapshot) -> CommanderObservation {
    let width = usize::try_from(snapshot.width).unwrap_or(0);
    let height = usize::try_from(snapshot.height).unwrap_or(0);
    let mut commanders = vec![vec![0i8; width]; height];
    let mut subordinates = vec![vec![0i8; width]; height];

    let sightings = squad.commander.observation.iter().flat_map(|o| o.iter());
    for sighting in sightings {
        let (Ok(x), Ok(y)) = (
            usize::try_from(sighting.position.x()),
            usize::try_from(sighting.position.y()),
        ) else {
            continue;
        };
        for entity in &sighting.entities {
            let Some(affiliation) = snapshot.affiliation_of(*entity) else {
                continue;
            };
            let mark = if affiliation.camp == squad.camp { 1 } else { -1 };
            let layer = match affiliation.rank {
                Rank::Commander => &mut commanders,
                Rank::Subordinate => &mut subordinates,
            };
            if let Some(cell) = layer.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = mark;
            }
        }
    }

    CommanderObservation {
        camp: squad.camp,
        team: squad.camp.index(),
        position: squad
            .commander
            .last_position
            .unwrap_or(Position::new(0, 0)),
        commanders,
        subordinates,
    }
}

fn distance_sum(origin: Position, others: impl Iterator<Item = Position>) -> i64 {
    others
        .map(|other| i64::from(origin.manhattan_distance(other)))
        .sum()
}
