#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for RunTag.
//!
//! The world owns the grid, both squads and their radio channels. Adapters
//! never mutate it directly: every change goes through [`apply`], which
//! validates the actor, executes one [`Action`] and reports what happened as
//! [`Event`] values. Read access goes through [`query`].

mod bootcamp;
mod equipment;
mod game;
mod grid;
mod roster;
mod station;

use std::time::Instant;

use runtag_core::{Action, ActionError, EntityId, Event, Observation, Order, Position};

pub use bootcamp::Bootcamp;
pub use equipment::{Compass, Equipment, Radio, Telescope, Transmission};
pub use game::{Game, LayoutError, MAX_LAYOUT_ATTEMPTS};
pub use grid::Grid;
pub use roster::{Commander, Soldier, Squad, Subordinate};
pub use station::{Message, Station, Stations};

/// What an applied action produced for its actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A commander refreshed its instruments.
    Observed {
        /// Position reported by the compass.
        position: Position,
        /// Sweep reported by the telescope.
        observation: Observation,
    },
    /// A soldier moved, or held, and now stands here.
    Moved(Position),
    /// A commander queued an order.
    Commanded {
        /// Subordinate the order is addressed to.
        receiver: EntityId,
    },
    /// A subordinate listened and heard this order.
    Heard(Order),
}

/// Applies `action` on behalf of `actor` at time `now`.
///
/// The actor must be enlisted and hold the rank the action requires. Failed
/// actions leave the game untouched. A [`Event::CommanderTagged`] event is
/// emitted for every commander the action newly tagged.
pub fn apply(
    game: &mut Game,
    actor: EntityId,
    action: Action,
    now: Instant,
    out_events: &mut Vec<Event>,
) -> Result<ActionOutcome, ActionError> {
    let affiliation = game
        .affiliation_of(actor)
        .ok_or(ActionError::UnknownActor(actor))?;
    if affiliation.rank != action.rank() {
        return Err(ActionError::RankMismatch {
            entity: actor,
            required: action.rank(),
        });
    }

    let tagged_before = game.tagged();
    let outcome = game.act(actor, affiliation, action, now, out_events)?;
    for camp in game.tagged() {
        if !tagged_before.contains(&camp) {
            out_events.push(Event::CommanderTagged { camp });
        }
    }
    Ok(outcome)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use runtag_core::{
        Camp, CommanderSnapshot, GameSnapshot, GridError, RosterEntry, SquadSnapshot,
        SubordinateSnapshot,
    };

    use super::{Game, Soldier};

    /// Captures a serializable view of the whole game.
    pub fn snapshot(game: &Game) -> Result<GameSnapshot, GridError> {
        let grid = game.grid();
        let squads = game
            .squads()
            .iter()
            .map(|squad| -> Result<SquadSnapshot, GridError> {
                let commander = squad.commander();
                let subordinates = squad
                    .subordinates()
                    .iter()
                    .map(|subordinate| -> Result<SubordinateSnapshot, GridError> {
                        Ok(SubordinateSnapshot {
                            entity: subordinate.entity(),
                            identifier: subordinate.identifier(),
                            position: grid.position_of(subordinate.entity())?,
                            direction: subordinate.direction(),
                        })
                    })
                    .collect::<Result<Vec<_>, GridError>>()?;
                Ok(SquadSnapshot {
                    camp: squad.camp(),
                    commander: CommanderSnapshot {
                        entity: commander.entity(),
                        position: grid.position_of(commander.entity())?,
                        last_position: commander.position(),
                        observation: commander.observation().cloned(),
                    },
                    subordinates,
                })
            })
            .collect::<Result<Vec<_>, GridError>>()?;

        Ok(GameSnapshot {
            width: grid.width(),
            height: grid.height(),
            squads,
            done: game.done(),
            winner: game.winner(),
        })
    }

    /// Flattened roster in slot order.
    #[must_use]
    pub fn roster(game: &Game) -> Vec<RosterEntry> {
        game.soldiers()
    }

    /// Orders still waiting in the mailbox of `camp`.
    #[must_use]
    pub fn pending_orders(game: &Game, camp: Camp) -> usize {
        game.stations().get(camp).map_or(0, |station| station.pending())
    }
}
