//! The game aggregate: one grid, two squads and their radio channels.

use std::time::{Duration, Instant};

use rand::Rng;
use runtag_core::{
    Action, ActionError, Affiliation, Camp, ConfigError, EntityId, Event, GameConfig, GridError,
    Order, Position, Rank, RosterEntry, Winner,
};
use runtag_system_formation::{Formation, FormationError};
use thiserror::Error;
use tracing::debug;

use crate::{
    bootcamp::Bootcamp,
    grid::Grid,
    roster::{Soldier, Squad},
    station::Stations,
    ActionOutcome,
};

/// Number of layouts tried before [`Game::make`] gives up.
pub const MAX_LAYOUT_ATTEMPTS: u32 = 1024;

/// Failures raised while building a game.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The configuration is not playable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Squads do not fit their corners.
    #[error(transparent)]
    Formation(#[from] FormationError),
    /// A soldier could not be placed.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The number of spawn positions does not match the squad size.
    #[error("{camp} squad has {expected} soldiers but {provided} spawn positions")]
    PositionCount {
        /// Camp being spawned.
        camp: Camp,
        /// Soldiers in the squad.
        expected: usize,
        /// Positions supplied.
        provided: usize,
    },
    /// Every sampled layout started with a tagged commander.
    #[error("no playable layout found after {attempts} attempts")]
    Exhausted {
        /// Number of layouts sampled.
        attempts: u32,
    },
}

/// Authoritative state of one episode.
#[derive(Clone, Debug)]
pub struct Game {
    grid: Grid,
    squads: Vec<Squad>,
    stations: Stations<Order>,
}

impl Game {
    /// Creates a game on an empty `width × height` grid with no squads.
    #[must_use]
    pub fn new(width: u32, height: u32, mailbox_ttl: Duration) -> Self {
        Self {
            grid: Grid::new(width, height),
            squads: Vec::new(),
            stations: Stations::new(mailbox_ttl),
        }
    }

    /// Recruits both squads and scatters them over random corners.
    ///
    /// Layouts in which a commander starts out tagged are rerolled.
    pub fn make<R>(config: &GameConfig, rng: &mut R) -> Result<Self, LayoutError>
    where
        R: Rng + ?Sized,
    {
        config.validate()?;
        let formation = Formation::new(config.width, config.height);
        let squad_size = 1 + usize::try_from(config.subordinates).unwrap_or(usize::MAX);

        for attempt in 1..=MAX_LAYOUT_ATTEMPTS {
            let layout = formation.place(Camp::ALL.len(), squad_size, rng)?;
            let mut game = Self::new(config.width, config.height, config.mailbox_ttl());
            let mut bootcamp = Bootcamp::new();
            for (camp, cells) in Camp::ALL.into_iter().zip(layout) {
                let squad = bootcamp.recruit(camp, config.subordinates);
                let (commander, subordinates) =
                    cells.split_first().ok_or(LayoutError::PositionCount {
                        camp,
                        expected: squad_size,
                        provided: 0,
                    })?;
                game.spawn(squad, *commander, subordinates)?;
            }

            if !game.done() {
                return Ok(game);
            }
            debug!(attempt, "initial layout starts tagged, rerolling");
        }

        Err(LayoutError::Exhausted {
            attempts: MAX_LAYOUT_ATTEMPTS,
        })
    }

    /// Places a squad on the grid and adds it to the roster.
    ///
    /// The commander lands on `commander` and subordinates on
    /// `subordinates` in identifier order. Nothing is placed unless every
    /// position is accepted. A squad of an already present camp replaces it,
    /// and the replaced soldiers are taken off the grid.
    pub fn spawn(
        &mut self,
        squad: Squad,
        commander: Position,
        subordinates: &[Position],
    ) -> Result<(), LayoutError> {
        if subordinates.len() != squad.subordinates().len() {
            return Err(LayoutError::PositionCount {
                camp: squad.camp(),
                expected: 1 + squad.subordinates().len(),
                provided: 1 + subordinates.len(),
            });
        }

        let placements: Vec<(Position, EntityId)> = std::iter::once(commander)
            .chain(subordinates.iter().copied())
            .zip(squad.soldiers().map(|soldier| soldier.entity()))
            .collect();
        let mut staged = self.grid.clone();
        if let Some(replaced) = self.squad(squad.camp()) {
            for soldier in replaced.soldiers() {
                let _ = staged.remove(soldier.entity())?;
            }
        }
        for (position, entity) in placements {
            staged.add(position, entity)?;
        }

        self.grid = staged;
        self.squads.retain(|existing| existing.camp() != squad.camp());
        self.squads.push(squad);
        self.squads.sort_by_key(Squad::camp);
        Ok(())
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Radio channels of both squads.
    #[must_use]
    pub const fn stations(&self) -> &Stations<Order> {
        &self.stations
    }

    /// Squads in roster order.
    #[must_use]
    pub fn squads(&self) -> &[Squad] {
        &self.squads
    }

    /// Squad of `camp`.
    #[must_use]
    pub fn squad(&self, camp: Camp) -> Option<&Squad> {
        self.squads.iter().find(|squad| squad.camp() == camp)
    }

    /// Flattened roster: blue commander, blue subordinates, red commander,
    /// red subordinates.
    #[must_use]
    pub fn soldiers(&self) -> Vec<RosterEntry> {
        self.squads
            .iter()
            .flat_map(|squad| {
                let commander = RosterEntry {
                    camp: squad.camp(),
                    rank: Rank::Commander,
                    identifier: None,
                    entity: squad.commander().entity(),
                };
                std::iter::once(commander).chain(squad.subordinates().iter().map(|subordinate| {
                    RosterEntry {
                        camp: squad.camp(),
                        rank: Rank::Subordinate,
                        identifier: Some(subordinate.identifier()),
                        entity: subordinate.entity(),
                    }
                }))
            })
            .collect()
    }

    /// Camp and rank of `entity`.
    #[must_use]
    pub fn affiliation_of(&self, entity: EntityId) -> Option<Affiliation> {
        self.squads.iter().find_map(|squad| {
            squad
                .rank_of(entity)
                .map(|rank| Affiliation::new(squad.camp(), rank))
        })
    }

    /// Reports whether the commander of `camp` shares a tile with an enemy
    /// subordinate.
    #[must_use]
    pub fn is_tagged(&self, camp: Camp) -> bool {
        let Some(squad) = self.squad(camp) else {
            return false;
        };
        let Ok(neighbours) = self.grid.entities_with(squad.commander().entity()) else {
            return false;
        };
        neighbours.into_iter().any(|entity| {
            self.affiliation_of(entity)
                == Some(Affiliation::new(camp.opponent(), Rank::Subordinate))
        })
    }

    /// Camps whose commander is currently tagged.
    #[must_use]
    pub fn tagged(&self) -> Vec<Camp> {
        Camp::ALL
            .into_iter()
            .filter(|camp| self.is_tagged(*camp))
            .collect()
    }

    /// Whether any commander is tagged.
    #[must_use]
    pub fn done(&self) -> bool {
        Camp::ALL.into_iter().any(|camp| self.is_tagged(camp))
    }

    /// Verdict once the game is done: the opponent of a lone tagged
    /// commander wins, and two tagged commanders make a draw.
    #[must_use]
    pub fn winner(&self) -> Option<Winner> {
        match self.tagged().as_slice() {
            [] => None,
            [camp] => Some(Winner::camp(camp.opponent())),
            _ => Some(Winner::Draw),
        }
    }

    pub(crate) fn act(
        &mut self,
        actor: EntityId,
        affiliation: Affiliation,
        action: Action,
        now: Instant,
        out_events: &mut Vec<Event>,
    ) -> Result<ActionOutcome, ActionError> {
        let Self {
            grid,
            squads,
            stations,
        } = self;
        let camp = affiliation.camp;
        let squad = squads
            .iter_mut()
            .find(|squad| squad.camp() == camp)
            .ok_or(ActionError::UnknownActor(actor))?;

        match action {
            Action::CommanderObserve => {
                let commander = squad.commander_mut();
                let observation = commander.observe(grid)?.clone();
                let position = grid.position_of(actor)?;
                out_events.push(Event::Observed {
                    commander: actor,
                    position,
                    sightings: observation.len(),
                });
                Ok(ActionOutcome::Observed {
                    position,
                    observation,
                })
            }
            Action::CommanderMove { direction } => {
                let from = grid.position_of(actor)?;
                let to = squad.commander_mut().step(grid, direction)?;
                out_events.push(Event::CommanderMoved {
                    commander: actor,
                    from,
                    to,
                });
                Ok(ActionOutcome::Moved(to))
            }
            Action::CommanderCommand {
                subordinate,
                direction,
            } => {
                let receiver = squad
                    .subordinate(subordinate)
                    .map(Soldier::entity)
                    .ok_or(ActionError::UnknownSubordinate {
                        camp,
                        identifier: subordinate,
                    })?;
                squad
                    .commander()
                    .command(stations, receiver, direction, now)?;
                out_events.push(Event::OrderSent {
                    sender: actor,
                    receiver,
                    order: direction,
                });
                Ok(ActionOutcome::Commanded { receiver })
            }
            Action::SubordinateListen => {
                let order = squad
                    .subordinate_mut(actor)
                    .ok_or(ActionError::UnknownActor(actor))?
                    .listen(stations, now)?;
                out_events.push(Event::OrderHeard {
                    subordinate: actor,
                    order,
                });
                Ok(ActionOutcome::Heard(order))
            }
            Action::SubordinateMove { direction } => {
                let from = grid.position_of(actor)?;
                let to = squad
                    .subordinate_mut(actor)
                    .ok_or(ActionError::UnknownActor(actor))?
                    .step(grid, direction)?;
                out_events.push(Event::SubordinateMoved {
                    subordinate: actor,
                    from,
                    to,
                });
                Ok(ActionOutcome::Moved(to))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn made_games_never_start_terminal() {
        let config = GameConfig::new(4, 4, 2);
        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let game = Game::make(&config, &mut rng).expect("layout");
            assert!(!game.done(), "seed {seed} produced a terminal layout");
            assert_eq!(game.soldiers().len(), config.slot_count());
        }
    }

    #[test]
    fn spawn_rejects_mismatched_positions_without_placing() {
        let mut game = Game::new(4, 4, Duration::from_secs(5));
        let squad = Bootcamp::new().recruit(Camp::Blue, 2);
        let result = game.spawn(squad, Position::new(0, 0), &[Position::new(1, 0)]);
        assert_eq!(
            result,
            Err(LayoutError::PositionCount {
                camp: Camp::Blue,
                expected: 3,
                provided: 2,
            })
        );
        assert_eq!(game.grid().entities().count(), 0);
        assert!(game.squads().is_empty());
    }

    #[test]
    fn respawning_a_camp_clears_the_replaced_squad_from_the_grid() {
        let mut game = Game::new(4, 4, Duration::from_secs(5));
        let mut bootcamp = Bootcamp::new();
        let first = bootcamp.recruit(Camp::Blue, 1);
        let second = bootcamp.recruit(Camp::Blue, 1);
        game.spawn(first, Position::new(0, 0), &[Position::new(1, 0)])
            .expect("first squad");
        game.spawn(second, Position::new(3, 3), &[Position::new(2, 3)])
            .expect("replacement squad");

        assert_eq!(game.grid().entities().count(), game.soldiers().len());
        assert!(!game.grid().contains(EntityId::new(0)));
        assert!(!game.grid().contains(EntityId::new(1)));
        assert_eq!(
            game.grid().entities_at(Position::new(0, 0)),
            Ok(Vec::new()),
            "old commander tile is vacated"
        );
        assert_eq!(game.squads().len(), 1);
    }

    #[test]
    fn failed_respawn_keeps_the_existing_squad_in_place() {
        let mut game = Game::new(4, 4, Duration::from_secs(5));
        let mut bootcamp = Bootcamp::new();
        let first = bootcamp.recruit(Camp::Blue, 1);
        let second = bootcamp.recruit(Camp::Blue, 1);
        game.spawn(first, Position::new(0, 0), &[Position::new(1, 0)])
            .expect("first squad");
        let result = game.spawn(second, Position::new(9, 9), &[Position::new(2, 3)]);

        assert!(matches!(result, Err(LayoutError::Grid(_))));
        assert_eq!(game.grid().position_of(EntityId::new(0)), Ok(Position::new(0, 0)));
        assert_eq!(game.grid().entities().count(), 2);
    }

    #[test]
    fn invalid_config_is_reported() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = GameConfig::new(0, 3, 1);
        assert!(matches!(
            Game::make(&config, &mut rng),
            Err(LayoutError::Config(ConfigError::EmptyGrid { .. }))
        ));
    }
}
