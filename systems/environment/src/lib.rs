#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Step-function surface over the world for learning agents.
//!
//! An [`Environment`] runs one episode at a time. Every step takes one
//! discrete action per roster slot, applies commanders first and subordinates
//! second, and returns per-slot observations, rewards and done flags. The
//! mailbox clock is virtual and advances one second per step.

mod encoding;
mod observation;
mod policy;

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use runtag_core::{ActionError, GameConfig, GameSnapshot, Rank};
use runtag_world::{apply, query, Game, LayoutError};
use thiserror::Error;
use tracing::{debug, info};

pub use encoding::{direction_index, ActionSpace, DIRECTIONS};
pub use observation::{
    observations, rewards, AgentObservation, CommanderObservation, SubordinateObservation,
};
pub use policy::{ObedientPolicy, Policy, RandomPolicy, SquadPolicy};

const STEP_QUANTUM: Duration = Duration::from_secs(1);

/// Failures raised while driving an episode.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    /// No game could be laid out.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// The world rejected an action.
    #[error(transparent)]
    Action(#[from] ActionError),
    /// `step` was called before `reset`.
    #[error("environment must be reset before stepping")]
    NotReset,
    /// The number of actions differs from the number of slots.
    #[error("expected {expected} actions, got {provided}")]
    ActionCount {
        /// Roster slots.
        expected: usize,
        /// Actions supplied.
        provided: usize,
    },
    /// An action index lies outside the action space of its slot.
    #[error("action {index} is outside an action space of {actions}")]
    InvalidAction {
        /// Offending index.
        index: usize,
        /// Size of the slot's action space.
        actions: usize,
    },
}

/// Result of one environment step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// One observation per slot.
    pub observations: Vec<AgentObservation>,
    /// One reward per slot.
    pub rewards: Vec<i64>,
    /// One done flag per slot.
    pub dones: Vec<bool>,
    /// Set when the step limit had already been reached; nothing was applied.
    pub exceeded: bool,
}

/// Episode driver over a freshly made game per reset.
#[derive(Debug)]
pub struct Environment {
    config: GameConfig,
    space: ActionSpace,
    rng: ChaCha8Rng,
    game: Option<Game>,
    steps: u64,
    clock: Instant,
}

impl Environment {
    /// Creates an environment whose layouts are drawn from `seed`.
    #[must_use]
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            space: ActionSpace::new(config.subordinates),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            game: None,
            steps: 0,
            clock: Instant::now(),
        }
    }

    /// Action encoding used by [`Environment::step`].
    #[must_use]
    pub const fn space(&self) -> ActionSpace {
        self.space
    }

    /// Steps taken in the current episode.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Game of the current episode.
    #[must_use]
    pub const fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Starts a new episode and returns the initial observations.
    pub fn reset(&mut self) -> Result<Vec<AgentObservation>, EnvironmentError> {
        let game = Game::make(&self.config, &mut self.rng)?;
        let snapshot = snapshot_of(&game)?;
        self.game = Some(game);
        self.steps = 0;
        self.clock = Instant::now();
        info!(
            width = self.config.width,
            height = self.config.height,
            subordinates = self.config.subordinates,
            "episode reset"
        );
        Ok(observations(&snapshot))
    }

    /// Applies one action per slot, commanders first.
    ///
    /// Actions are validated before any is applied. Once the step limit is
    /// reached, steps apply nothing and report every slot as done.
    pub fn step(&mut self, actions: &[usize]) -> Result<Step, EnvironmentError> {
        let space = self.space;
        let game = self.game.as_mut().ok_or(EnvironmentError::NotReset)?;
        let roster = game.soldiers();
        if actions.len() != roster.len() {
            return Err(EnvironmentError::ActionCount {
                expected: roster.len(),
                provided: actions.len(),
            });
        }

        if self.config.max_steps.is_some_and(|limit| self.steps >= limit) {
            let snapshot = snapshot_of(game)?;
            return Ok(Step {
                observations: observations(&snapshot),
                rewards: rewards(&snapshot),
                dones: vec![true; roster.len()],
                exceeded: true,
            });
        }

        let mut commanders = Vec::new();
        let mut subordinates = Vec::new();
        for (entry, index) in roster.iter().zip(actions) {
            match entry.rank {
                Rank::Commander => commanders.push((entry.entity, space.commander_action(*index)?)),
                Rank::Subordinate => {
                    subordinates.push((entry.entity, space.subordinate_action(*index)?));
                }
            }
        }

        let mut events = Vec::new();
        for (entity, action) in commanders.into_iter().chain(subordinates) {
            let _ = apply(game, entity, action, self.clock, &mut events)?;
        }
        self.clock += STEP_QUANTUM;
        self.steps += 1;
        debug!(step = self.steps, ?events, "step applied");

        let snapshot = snapshot_of(game)?;
        Ok(Step {
            observations: observations(&snapshot),
            rewards: rewards(&snapshot),
            dones: vec![snapshot.done; roster.len()],
            exceeded: false,
        })
    }

    /// Snapshot of the current episode.
    pub fn snapshot(&self) -> Result<GameSnapshot, EnvironmentError> {
        let game = self.game.as_ref().ok_or(EnvironmentError::NotReset)?;
        snapshot_of(game)
    }
}

fn snapshot_of(game: &Game) -> Result<GameSnapshot, EnvironmentError> {
    query::snapshot(game).map_err(|error| EnvironmentError::Action(error.into()))
}
