//! Logical session protocol exchanged between the room and remote agents.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Action, Camp, GameSnapshot, ProtocolError, Rank};

/// Join request sent once by every newly connected client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Affiliation {
    /// Team the client wants to play for.
    pub camp: Camp,
    /// Role the client wants to play.
    pub rank: Rank,
}

impl Affiliation {
    /// Creates a new affiliation.
    #[must_use]
    pub const fn new(camp: Camp, rank: Rank) -> Self {
        Self { camp, rank }
    }
}

/// Action kinds understood by the room. Each maps 1:1 onto an [`Action`] constructor
/// once combined with the sender's rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Commander only: refresh position and observation.
    Observe,
    /// Either rank: move one tile.
    Move,
    /// Commander only: radio an order to a subordinate.
    Command,
    /// Subordinate only: receive one pending order.
    Listen,
}

impl ActionKind {
    /// Lowercase token used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observe => "observe",
            Self::Move => "move",
            Self::Command => "command",
            Self::Listen => "listen",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "observe" => Ok(Self::Observe),
            "move" => Ok(Self::Move),
            "command" => Ok(Self::Command),
            "listen" => Ok(Self::Listen),
            other => Err(ProtocolError::UnknownAction(other.to_owned())),
        }
    }
}

/// Action request: a kind string plus positional parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Requested action kind, validated by the room.
    pub action: String,
    /// Positional parameters matching the action constructor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
}

impl ActionRequest {
    /// Creates a request from a raw kind string and parameters.
    #[must_use]
    pub fn new(action: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self {
            action: action.into(),
            parameters,
        }
    }

    /// Encodes a typed action into its wire request.
    #[must_use]
    pub fn from_action(action: &Action) -> Self {
        let kind = action.kind().as_str();
        match *action {
            Action::CommanderObserve | Action::SubordinateListen => Self::new(kind, Vec::new()),
            Action::CommanderMove { direction } | Action::SubordinateMove { direction } => {
                Self::new(kind, vec![order_value(direction)])
            }
            Action::CommanderCommand {
                subordinate,
                direction,
            } => Self::new(kind, vec![Value::from(subordinate), order_value(direction)]),
        }
    }

    /// Parses the kind string.
    pub fn kind(&self) -> Result<ActionKind, ProtocolError> {
        self.action.parse()
    }
}

fn order_value(direction: crate::Order) -> Value {
    direction.map_or(Value::Null, |direction| Value::from(direction.as_str()))
}

/// Any message a client may send.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// Registration request.
    Join(Affiliation),
    /// Action request.
    Act(ActionRequest),
}

/// Any message the room may send.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to a successful join.
    Assigned {
        /// Roster slot bound to the client.
        slot: usize,
    },
    /// Full game state, sent once after gathering and after every action.
    Snapshot {
        /// Current game state.
        game: GameSnapshot,
    },
    /// The last request was refused; shared state is unchanged.
    Rejected {
        /// Human readable reason.
        reason: String,
    },
    /// The game reached a terminal state; no further requests are served.
    Finished {
        /// Final game state.
        game: GameSnapshot,
    },
}
