#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Transport-agnostic session room binding remote clients to roster slots.
//!
//! A [`Room`] walks through GATHERING → READY → RUNNING → TERMINAL. While
//! gathering it binds client identities to the fixed roster slots of its
//! game. Once every slot is bound it may be started, which broadcasts the
//! initial snapshot. While running it resolves requests one at a time against
//! the sender's bound soldier and replies with the updated snapshot. When a
//! commander is tagged it broadcasts the final snapshot once and refuses
//! further requests.
//!
//! The room owns no transport. Callers feed it identities and decoded
//! requests and deliver the messages it hands back.

mod dispatch;

use std::{collections::HashMap, fmt::Debug, hash::Hash, ops::Range, time::Instant};

use runtag_core::{
    ActionRequest, Affiliation, Camp, Event, GameSnapshot, ProtocolError, Rank, RosterEntry,
    ServerMessage, SlotConflict,
};
use runtag_world::{apply, query, Game};
use tracing::{debug, info, warn};

pub use dispatch::resolve;

/// Lifecycle phase of a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for clients to bind every slot.
    Gathering,
    /// Every slot is bound; the initial broadcast is pending.
    Ready,
    /// Serving action requests.
    Running,
    /// A commander has been tagged; no further requests are served.
    Terminal,
}

/// One message addressed to several identities.
#[derive(Clone, Debug, PartialEq)]
pub struct Broadcast<I> {
    /// Identities that should receive the message, in slot order.
    pub recipients: Vec<I>,
    /// The message to deliver.
    pub message: ServerMessage,
}

/// Result of one served request.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn<I> {
    /// Snapshot to reply to the sender with.
    pub snapshot: GameSnapshot,
    /// Events emitted while applying the action.
    pub events: Vec<Event>,
    /// Terminal broadcast, present on the request that ended the game.
    pub finished: Option<Broadcast<I>>,
}

/// Session state machine over one game.
#[derive(Debug)]
pub struct Room<I> {
    game: Game,
    slots: Vec<RosterEntry>,
    bindings: Vec<Option<I>>,
    identities: HashMap<I, usize>,
    phase: Phase,
}

impl<I> Room<I>
where
    I: Clone + Debug + Eq + Hash,
{
    /// Opens a room for `game`, with one slot per soldier in roster order.
    #[must_use]
    pub fn new(game: Game) -> Self {
        let slots = game.soldiers();
        Self {
            bindings: vec![None; slots.len()],
            slots,
            game,
            identities: HashMap::new(),
            phase: Phase::Gathering,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The game being played.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Roster slots in index order.
    #[must_use]
    pub fn slots(&self) -> &[RosterEntry] {
        &self.slots
    }

    /// Identity bound to slot `index`.
    #[must_use]
    pub fn index_identity(&self, index: usize) -> Option<&I> {
        self.bindings.get(index).and_then(Option::as_ref)
    }

    /// Slot bound to `identity`.
    #[must_use]
    pub fn identity_index(&self, identity: &I) -> Option<usize> {
        self.identities.get(identity).copied()
    }

    /// Roster entry of the soldier bound to `identity`.
    #[must_use]
    pub fn soldier_of(&self, identity: &I) -> Option<RosterEntry> {
        self.identity_index(identity)
            .and_then(|index| self.slots.get(index).copied())
    }

    /// Slot a join with `affiliation` would be bound to.
    ///
    /// Blue owns the first half of the roster and red the second. A
    /// commander always takes the first index of its half; subordinates take
    /// the first free index after it.
    pub fn assign_index(&self, affiliation: Affiliation) -> Result<usize, SlotConflict> {
        let half = self.half(affiliation.camp);
        match affiliation.rank {
            Rank::Commander => {
                if self.is_free(half.start) {
                    Ok(half.start)
                } else {
                    Err(SlotConflict::CommanderTaken(affiliation.camp))
                }
            }
            Rank::Subordinate => (half.start + 1..half.end)
                .find(|index| self.is_free(*index))
                .ok_or(SlotConflict::SubordinatesFull(affiliation.camp)),
        }
    }

    /// Binds `identity` to the slot matching `affiliation`.
    ///
    /// A rejected join leaves every existing binding untouched. Binding the
    /// last free slot moves the room to [`Phase::Ready`].
    pub fn join(&mut self, identity: I, affiliation: Affiliation) -> Result<usize, SlotConflict> {
        if let Some(index) = self.identity_index(&identity) {
            warn!(?identity, slot = index, "identity is already bound");
            return Err(SlotConflict::IdentityBound(index));
        }

        let index = self.assign_index(affiliation).map_err(|conflict| {
            warn!(
                ?identity,
                camp = %affiliation.camp,
                rank = %affiliation.rank,
                %conflict,
                "join rejected"
            );
            conflict
        })?;

        if let Some(binding) = self.bindings.get_mut(index) {
            *binding = Some(identity.clone());
        }
        let _ = self.identities.insert(identity.clone(), index);
        info!(
            ?identity,
            camp = %affiliation.camp,
            rank = %affiliation.rank,
            slot = index,
            "client joined"
        );

        if self.phase == Phase::Gathering && self.is_ready() {
            self.phase = Phase::Ready;
        }
        Ok(index)
    }

    /// Reports whether every slot is bound.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.bindings.iter().all(Option::is_some)
    }

    /// Starts the game, returning the initial snapshot for every identity.
    ///
    /// Succeeds exactly once, after the room became ready.
    pub fn start(&mut self) -> Result<Broadcast<I>, ProtocolError> {
        if self.phase != Phase::Ready {
            return Err(ProtocolError::NotReady);
        }
        let game = self.snapshot()?;
        self.phase = Phase::Running;
        info!(slots = self.slots.len(), "every slot bound, game running");
        Ok(self.broadcast(ServerMessage::Snapshot { game }))
    }

    /// Serves one action request from `identity` at time `now`.
    ///
    /// Rejected requests leave the game untouched and keep the room running.
    pub fn handle(
        &mut self,
        identity: &I,
        request: &ActionRequest,
        now: Instant,
    ) -> Result<Turn<I>, ProtocolError> {
        if self.phase != Phase::Running {
            return Err(ProtocolError::NotRunning);
        }
        let soldier = self
            .soldier_of(identity)
            .ok_or(ProtocolError::UnknownIdentity)?;

        let action = resolve(soldier.rank, request).map_err(|error| {
            warn!(?identity, %error, "request rejected");
            error
        })?;
        let mut events = Vec::new();
        let _ = apply(&mut self.game, soldier.entity, action, now, &mut events).map_err(
            |error| {
                warn!(?identity, %error, "action rejected");
                ProtocolError::from(error)
            },
        )?;
        debug!(?identity, ?action, ?events, "action applied");

        let snapshot = self.snapshot()?;
        let finished = if self.game.done() {
            self.phase = Phase::Terminal;
            info!(winner = ?snapshot.winner, "game finished");
            Some(self.broadcast(ServerMessage::Finished {
                game: snapshot.clone(),
            }))
        } else {
            None
        };

        Ok(Turn {
            snapshot,
            events,
            finished,
        })
    }

    fn snapshot(&self) -> Result<GameSnapshot, ProtocolError> {
        query::snapshot(&self.game).map_err(|error| ProtocolError::Action(error.into()))
    }

    fn broadcast(&self, message: ServerMessage) -> Broadcast<I> {
        Broadcast {
            recipients: self.bindings.iter().flatten().cloned().collect(),
            message,
        }
    }

    fn half(&self, camp: Camp) -> Range<usize> {
        let half = self.slots.len() / 2;
        match camp {
            Camp::Blue => 0..half,
            Camp::Red => half..self.slots.len(),
        }
    }

    fn is_free(&self, index: usize) -> bool {
        matches!(self.bindings.get(index), Some(None))
    }
}
