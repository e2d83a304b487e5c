//! Error types raised by the world, the session room and configuration loading.

use thiserror::Error;

use crate::{ActionKind, Camp, EntityId, Position, Rank};

/// Failures raised by grid placement, movement and queries.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The entity is already placed, or the position lies outside the grid.
    #[error("cannot place {entity} at {position}: {fault}")]
    InvalidPlacement {
        /// Entity that was being placed.
        entity: EntityId,
        /// Requested position.
        position: Position,
        /// Why the placement was refused.
        fault: PlacementFault,
    },
    /// The entity is not present on the grid.
    #[error("entity {0} is not on the grid")]
    UnknownEntity(EntityId),
    /// A query referenced a position outside the grid.
    #[error("position {0} is out of the grid")]
    OutOfBounds(Position),
}

/// Reason attached to [`GridError::InvalidPlacement`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PlacementFault {
    /// The entity already occupies a tile.
    #[error("entity is already on the grid")]
    AlreadyPlaced,
    /// The position lies outside the grid.
    #[error("position is out of the grid")]
    OutOfBounds,
}

/// Failures raised while applying an [`crate::Action`] to a soldier.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    /// Grid state rejected the action.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The radio operator does not belong to any squad.
    #[error("soldier {0} is not assigned to a squad and cannot use its radio")]
    UngroupedSender(EntityId),
    /// A command addressed a subordinate the squad does not have.
    #[error("{camp} squad has no subordinate #{identifier}")]
    UnknownSubordinate {
        /// Squad of the commander issuing the order.
        camp: Camp,
        /// Requested subordinate identifier.
        identifier: u32,
    },
    /// The actor does not hold the rank the action requires.
    #[error("entity {entity} is not a {required}")]
    RankMismatch {
        /// Addressed actor.
        entity: EntityId,
        /// Rank the action requires.
        required: Rank,
    },
    /// The addressed actor is not part of any roster.
    #[error("entity {0} is not enlisted in this game")]
    UnknownActor(EntityId),
}

/// A join request that cannot be bound to a roster slot.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SlotConflict {
    /// The camp's commander slot is already bound.
    #[error("{0}.commander is already joined")]
    CommanderTaken(Camp),
    /// Every subordinate slot of the camp is already bound.
    #[error("all {0}.subordinates are already joined")]
    SubordinatesFull(Camp),
    /// The requesting identity is already bound to a slot.
    #[error("client is already bound to slot {0}")]
    IdentityBound(usize),
}

/// Protocol violations reported back to the offending client.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The request named an action kind that does not exist.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    /// The action kind is not available to the sender's rank.
    #[error("a {rank} cannot perform '{action}'")]
    RoleViolation {
        /// Rank bound to the sender.
        rank: Rank,
        /// Requested action kind.
        action: ActionKind,
    },
    /// The positional parameters do not match the action constructor.
    #[error("invalid parameters for '{action}': {reason}")]
    InvalidParameters {
        /// Requested action kind.
        action: ActionKind,
        /// Human readable description of the mismatch.
        reason: String,
    },
    /// The sender has not joined the room.
    #[error("client has not joined the game")]
    UnknownIdentity,
    /// The room does not accept actions in its current phase.
    #[error("game is not running")]
    NotRunning,
    /// The room cannot start before every slot is bound, nor start twice.
    #[error("room is not ready to start")]
    NotReady,
    /// The message could not be decoded.
    #[error("malformed message: {0}")]
    Malformed(String),
    /// The world rejected the resolved action.
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Invalid game configuration.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// The grid has more tiles than a game may allocate.
    #[error("grid {width}x{height} exceeds the limit of {limit} tiles")]
    OversizedGrid {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
        /// Largest accepted tile count.
        limit: u64,
    },
    /// The mailbox time-to-live is zero.
    #[error("mailbox time-to-live must be positive")]
    ZeroTimeToLive,
}
