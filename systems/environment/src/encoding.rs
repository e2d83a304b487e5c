//! Discrete action spaces for commanders and subordinates.

use runtag_core::{Action, Direction, Order};

use crate::EnvironmentError;

/// Direction table shared by every discrete encoding: the no-op order first,
/// then up, left, down and right.
pub const DIRECTIONS: [Order; 5] = [
    None,
    Some(Direction::Up),
    Some(Direction::Left),
    Some(Direction::Down),
    Some(Direction::Right),
];

const MOVE_OFFSET: usize = 1;
const COMMAND_OFFSET: usize = MOVE_OFFSET + DIRECTIONS.len();

/// Index of `order` in [`DIRECTIONS`].
#[must_use]
pub const fn direction_index(order: Order) -> usize {
    match order {
        None => 0,
        Some(Direction::Up) => 1,
        Some(Direction::Left) => 2,
        Some(Direction::Down) => 3,
        Some(Direction::Right) => 4,
    }
}

/// Action encoding for squads with a fixed number of subordinates.
///
/// Commanders: `0` observes, `1..=5` move along [`DIRECTIONS`], and
/// `6 + identifier × 5 + d` commands subordinate `identifier` with direction
/// `d`. Subordinates: `0` listens and `1..=5` move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionSpace {
    subordinates: u32,
}

impl ActionSpace {
    /// Creates the encoding for squads of `subordinates` subordinates.
    #[must_use]
    pub const fn new(subordinates: u32) -> Self {
        Self { subordinates }
    }

    /// Number of discrete commander actions.
    #[must_use]
    pub const fn commander_actions(&self) -> usize {
        COMMAND_OFFSET + self.subordinates as usize * DIRECTIONS.len()
    }

    /// Number of discrete subordinate actions.
    #[must_use]
    pub const fn subordinate_actions(&self) -> usize {
        COMMAND_OFFSET
    }

    /// Decodes a commander action index.
    pub fn commander_action(&self, index: usize) -> Result<Action, EnvironmentError> {
        if index >= self.commander_actions() {
            return Err(EnvironmentError::InvalidAction {
                index,
                actions: self.commander_actions(),
            });
        }
        Ok(match index {
            0 => Action::CommanderObserve,
            index if index < COMMAND_OFFSET => Action::CommanderMove {
                direction: direction_at(index - MOVE_OFFSET),
            },
            index => {
                let offset = index - COMMAND_OFFSET;
                Action::CommanderCommand {
                    subordinate: u32::try_from(offset / DIRECTIONS.len()).unwrap_or(u32::MAX),
                    direction: direction_at(offset % DIRECTIONS.len()),
                }
            }
        })
    }

    /// Decodes a subordinate action index.
    pub fn subordinate_action(&self, index: usize) -> Result<Action, EnvironmentError> {
        match index {
            0 => Ok(Action::SubordinateListen),
            index if index < COMMAND_OFFSET => Ok(Action::SubordinateMove {
                direction: direction_at(index - MOVE_OFFSET),
            }),
            index => Err(EnvironmentError::InvalidAction {
                index,
                actions: self.subordinate_actions(),
            }),
        }
    }

    /// Encodes an action of either rank back into its index.
    #[must_use]
    pub fn index_of(&self, action: &Action) -> usize {
        match *action {
            Action::CommanderObserve | Action::SubordinateListen => 0,
            Action::CommanderMove { direction } | Action::SubordinateMove { direction } => {
                MOVE_OFFSET + direction_index(direction)
            }
            Action::CommanderCommand {
                subordinate,
                direction,
            } => {
                COMMAND_OFFSET
                    + subordinate as usize * DIRECTIONS.len()
                    + direction_index(direction)
            }
        }
    }
}

fn direction_at(index: usize) -> Order {
    DIRECTIONS.get(index).copied().flatten()
}
