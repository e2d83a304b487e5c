//! Resolution of wire requests into typed actions.

use runtag_core::{Action, ActionKind, ActionRequest, Order, ProtocolError, Rank};
use serde_json::Value;

/// Resolves `request` into the action a soldier of `rank` asked for.
///
/// Each rank has a fixed table of permitted kinds; anything outside it is a
/// [`ProtocolError::RoleViolation`]. Parameters are positional: `move` takes
/// one direction token, `command` takes a subordinate identifier and a
/// direction token, `observe` and `listen` take none.
pub fn resolve(rank: Rank, request: &ActionRequest) -> Result<Action, ProtocolError> {
    let kind = request.kind()?;
    let parameters = request.parameters.as_slice();

    match (rank, kind) {
        (Rank::Commander, ActionKind::Observe) => {
            arity(kind, parameters, 0)?;
            Ok(Action::CommanderObserve)
        }
        (Rank::Commander, ActionKind::Move) => match parameters {
            [direction] => Ok(Action::CommanderMove {
                direction: order(kind, direction)?,
            }),
            _ => Err(arity_mismatch(kind, parameters, 1)),
        },
        (Rank::Commander, ActionKind::Command) => match parameters {
            [subordinate, direction] => Ok(Action::CommanderCommand {
                subordinate: identifier(kind, subordinate)?,
                direction: order(kind, direction)?,
            }),
            _ => Err(arity_mismatch(kind, parameters, 2)),
        },
        (Rank::Subordinate, ActionKind::Listen) => {
            arity(kind, parameters, 0)?;
            Ok(Action::SubordinateListen)
        }
        (Rank::Subordinate, ActionKind::Move) => match parameters {
            [direction] => Ok(Action::SubordinateMove {
                direction: order(kind, direction)?,
            }),
            _ => Err(arity_mismatch(kind, parameters, 1)),
        },
        (rank, action) => Err(ProtocolError::RoleViolation { rank, action }),
    }
}

fn arity(kind: ActionKind, parameters: &[Value], expected: usize) -> Result<(), ProtocolError> {
    if parameters.len() == expected {
        Ok(())
    } else {
        Err(arity_mismatch(kind, parameters, expected))
    }
}

fn arity_mismatch(kind: ActionKind, parameters: &[Value], expected: usize) -> ProtocolError {
    ProtocolError::InvalidParameters {
        action: kind,
        reason: format!("expected {expected} parameters, got {}", parameters.len()),
    }
}

fn order(kind: ActionKind, value: &Value) -> Result<Order, ProtocolError> {
    serde_json::from_value(value.clone()).map_err(|_| ProtocolError::InvalidParameters {
        action: kind,
        reason: format!("{value} is not one of null, \"up\", \"left\", \"down\", \"right\""),
    })
}

fn identifier(kind: ActionKind, value: &Value) -> Result<u32, ProtocolError> {
    value
        .as_u64()
        .and_then(|identifier| u32::try_from(identifier).ok())
        .ok_or_else(|| ProtocolError::InvalidParameters {
            action: kind,
            reason: format!("{value} is not a subordinate identifier"),
        })
}
