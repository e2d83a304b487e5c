#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the RunTag engine.
//!
//! This crate defines the vocabulary that connects adapters, the authoritative
//! world, and the pure systems. Remote agents and local drivers express intent
//! as [`Action`] values, the world executes them through its `apply` entry
//! point and reports what happened as [`Event`] values. Everything that crosses
//! a process boundary (protocol messages and [`GameSnapshot`]) is serializable.

use std::fmt;

use serde::{Deserialize, Serialize};

mod config;
mod error;
mod protocol;
mod snapshot;

pub use config::{GameConfig, MAX_TILES};
pub use error::{
    ActionError, ConfigError, GridError, PlacementFault, ProtocolError, SlotConflict,
};
pub use protocol::{ActionKind, ActionRequest, Affiliation, ClientMessage, ServerMessage};
pub use snapshot::{
    CommanderSnapshot, GameSnapshot, Observation, Sighting, SquadSnapshot, SubordinateSnapshot,
};

/// Payload relayed from a commander to a subordinate. `None` is an explicit no-op order.
pub type Order = Option<Direction>;

/// Integer location on the grid. Immutable value type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a position from its column and row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Position one row above.
    #[must_use]
    pub const fn up(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    /// Position one row below.
    #[must_use]
    pub const fn down(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    /// Position one column to the left.
    #[must_use]
    pub const fn left(self) -> Self {
        Self::new(self.x - 1, self.y)
    }

    /// Position one column to the right.
    #[must_use]
    pub const fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    /// Translates the position by a unit offset in the provided direction.
    #[must_use]
    pub const fn translate(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => self.up(),
            Direction::Left => self.left(),
            Direction::Down => self.down(),
            Direction::Right => self.right(),
        }
    }

    /// Clamps the position into `[0, width) × [0, height)`.
    #[must_use]
    pub fn clip(self, width: u32, height: u32) -> Self {
        let max_x = i32::try_from(width).unwrap_or(i32::MAX).saturating_sub(1);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX).saturating_sub(1);
        Self::new(self.x.min(max_x).max(0), self.y.min(max_y).max(0))
    }

    /// Reports whether the two positions share a row or a column.
    #[must_use]
    pub const fn in_line(self, other: Position) -> bool {
        self.x == other.x || self.y == other.y
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub const fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward decreasing row indices.
    Up,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing row indices.
    Down,
    /// Toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in wire-table order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    /// Lowercase token used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Left => "left",
            Self::Down => "down",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team identifier. Also names the mailbox channel of the team's squad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Camp {
    /// The blue team, first in roster order.
    Blue,
    /// The red team, second in roster order.
    Red,
}

impl Camp {
    /// Camps in fixed roster order.
    pub const ALL: [Camp; 2] = [Camp::Blue, Camp::Red];

    /// Lowercase team name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    /// Position of the camp in roster order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Blue => 0,
            Self::Red => 1,
        }
    }

    /// The opposing camp.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }
}

impl fmt::Display for Camp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role a soldier plays within its squad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    /// Sees a cross-shaped slice of the grid and issues orders.
    Commander,
    /// Blind; moves according to the orders it hears.
    Subordinate,
}

impl Rank {
    /// Lowercase rank name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Commander => "commander",
            Self::Subordinate => "subordinate",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of an entity placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One fixed roster slot: team, role and the entity currently filling it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Team the soldier belongs to.
    pub camp: Camp,
    /// Role of the soldier.
    pub rank: Rank,
    /// Squad-local identifier, present for subordinates only.
    pub identifier: Option<u32>,
    /// Entity that represents the soldier on the grid.
    pub entity: EntityId,
}

/// Typed commands that a soldier may perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Refreshes the commander's cached position and telescope observation.
    CommanderObserve,
    /// Moves the commander and refreshes its cached position.
    CommanderMove {
        /// Direction of travel; `None` keeps the commander in place.
        direction: Order,
    },
    /// Radios an order to one subordinate of the commander's squad.
    CommanderCommand {
        /// Squad-local identifier of the addressed subordinate.
        subordinate: u32,
        /// Order to relay.
        direction: Order,
    },
    /// Receives at most one pending order and caches it on the subordinate.
    SubordinateListen,
    /// Moves the subordinate and clears its cached order.
    SubordinateMove {
        /// Direction of travel; `None` keeps the subordinate in place.
        direction: Order,
    },
}

impl Action {
    /// Rank required of the soldier performing the action.
    #[must_use]
    pub const fn rank(&self) -> Rank {
        match self {
            Self::CommanderObserve | Self::CommanderMove { .. } | Self::CommanderCommand { .. } => {
                Rank::Commander
            }
            Self::SubordinateListen | Self::SubordinateMove { .. } => Rank::Subordinate,
        }
    }

    /// Wire kind of the action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::CommanderObserve => ActionKind::Observe,
            Self::CommanderMove { .. } | Self::SubordinateMove { .. } => ActionKind::Move,
            Self::CommanderCommand { .. } => ActionKind::Command,
            Self::SubordinateListen => ActionKind::Listen,
        }
    }
}

/// Events emitted by the world after applying an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A commander refreshed its position and telescope observation.
    Observed {
        /// Commander that observed.
        commander: EntityId,
        /// Position reported by the compass.
        position: Position,
        /// Number of occupied positions in the sweep.
        sightings: usize,
    },
    /// A commander moved (possibly in place when clamped or ordered to hold).
    CommanderMoved {
        /// Commander that moved.
        commander: EntityId,
        /// Position before the move.
        from: Position,
        /// Position after the move.
        to: Position,
    },
    /// A commander radioed an order to a subordinate.
    OrderSent {
        /// Commander that issued the order.
        sender: EntityId,
        /// Subordinate that should hear the order.
        receiver: EntityId,
        /// The relayed order.
        order: Order,
    },
    /// A subordinate listened to its radio.
    OrderHeard {
        /// Subordinate that listened.
        subordinate: EntityId,
        /// Order heard, `None` when nothing was pending.
        order: Order,
    },
    /// A subordinate moved.
    SubordinateMoved {
        /// Subordinate that moved.
        subordinate: EntityId,
        /// Position before the move.
        from: Position,
        /// Position after the move.
        to: Position,
    },
    /// A commander became tagged by an enemy subordinate.
    CommanderTagged {
        /// Camp whose commander was tagged.
        camp: Camp,
    },
}

/// Result of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// Only the red commander was tagged.
    Blue,
    /// Only the blue commander was tagged.
    Red,
    /// Both commanders were tagged.
    Draw,
}

impl Winner {
    /// Winner when exactly one camp prevailed.
    #[must_use]
    pub const fn camp(camp: Camp) -> Self {
        match camp {
            Camp::Blue => Self::Blue,
            Camp::Red => Self::Red,
        }
    }

    /// Lowercase name of the verdict.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Draw => "draw",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_clamps_into_bounds() {
        assert_eq!(Position::new(-1, 7).clip(5, 5), Position::new(0, 4));
        assert_eq!(Position::new(2, 3).clip(5, 5), Position::new(2, 3));
    }

    #[test]
    fn translate_applies_unit_offsets() {
        let origin = Position::new(2, 2);
        assert_eq!(origin.translate(Direction::Up), Position::new(2, 1));
        assert_eq!(origin.translate(Direction::Down), Position::new(2, 3));
        assert_eq!(origin.translate(Direction::Left), Position::new(1, 2));
        assert_eq!(origin.translate(Direction::Right), Position::new(3, 2));
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = Position::new(1, 1);
        let destination = Position::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn actions_report_their_rank() {
        assert_eq!(Action::CommanderObserve.rank(), Rank::Commander);
        assert_eq!(
            Action::SubordinateMove { direction: None }.rank(),
            Rank::Subordinate
        );
        assert_eq!(
            Action::CommanderCommand {
                subordinate: 0,
                direction: Some(Direction::Up)
            }
            .kind(),
            ActionKind::Command
        );
    }

    #[test]
    fn wire_tokens_are_lowercase() {
        let encoded = serde_json::to_string(&[Some(Direction::Up), None]).expect("serialize");
        assert_eq!(encoded, r#"["up",null]"#);
        let camp: Camp = serde_json::from_str(r#""red""#).expect("deserialize");
        assert_eq!(camp, Camp::Red);
        assert_eq!(Winner::Draw.to_string(), "draw");
    }
}
