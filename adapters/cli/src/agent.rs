//! Remote agent: joins a session server and plays one slot with a built-in
//! policy until the game finishes.

use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use runtag_core::{
    ActionRequest, Affiliation, Camp, ClientMessage, GameSnapshot, Rank, ServerMessage,
};
use runtag_system_environment::{observations, ActionSpace, AgentObservation, Policy, SquadPolicy};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use tracing::{debug, info, warn};

/// Plays the slot matching `camp` and `rank` on the server at `address`.
///
/// Returns the final snapshot broadcast by the server.
pub(crate) async fn play(
    address: SocketAddr,
    camp: Camp,
    rank: Rank,
    seed: u64,
) -> Result<GameSnapshot> {
    let stream = TcpStream::connect(address)
        .await
        .with_context(|| format!("failed to connect to {address}"))?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let join = ClientMessage::Join(Affiliation::new(camp, rank));
    writer
        .write_all(encode(&join)?.as_bytes())
        .await
        .context("failed to send join request")?;

    let mut slot = None;
    let mut policy = None;
    let mut last = None;
    loop {
        let line = lines
            .next_line()
            .await
            .context("failed to read from server")?
            .context("server closed the connection")?;
        let message: ServerMessage =
            serde_json::from_str(&line).with_context(|| format!("unexpected reply `{line}`"))?;

        let snapshot = match message {
            ServerMessage::Assigned { slot: assigned } => {
                info!(%camp, %rank, slot = assigned, "joined");
                slot = Some(assigned);
                continue;
            }
            ServerMessage::Finished { game } => {
                info!(winner = ?game.winner, "game finished");
                return Ok(game);
            }
            ServerMessage::Snapshot { game } => game,
            ServerMessage::Rejected { reason } => {
                let Some(slot) = slot else {
                    bail!("join rejected: {reason}");
                };
                warn!(slot, %reason, "request rejected, choosing again");
                match last.take() {
                    Some(snapshot) => snapshot,
                    None => continue,
                }
            }
        };

        let slot = slot.context("snapshot received before a slot was assigned")?;
        if snapshot.done {
            continue;
        }
        let space = space_of(&snapshot);
        let policy = policy.get_or_insert_with(|| SquadPolicy::new(space, seed));
        let request = choose(policy, space, slot, &snapshot)?;
        debug!(slot, ?request, "acting");
        writer
            .write_all(encode(&ClientMessage::Act(request))?.as_bytes())
            .await
            .context("failed to send action request")?;
        last = Some(snapshot);
    }
}

/// Encoding shared by every squad of `snapshot`.
fn space_of(snapshot: &GameSnapshot) -> ActionSpace {
    let subordinates = snapshot
        .squads
        .first()
        .map_or(0, |squad| squad.subordinates.len());
    ActionSpace::new(u32::try_from(subordinates).unwrap_or(u32::MAX))
}

/// Lets `policy` pick the next request of the soldier on `slot`.
fn choose(
    policy: &mut impl Policy,
    space: ActionSpace,
    slot: usize,
    snapshot: &GameSnapshot,
) -> Result<ActionRequest> {
    let observation = observations(snapshot)
        .into_iter()
        .nth(slot)
        .with_context(|| format!("slot {slot} is not on the roster"))?;
    let index = policy.act(&observation);
    let action = match observation {
        AgentObservation::Commander(_) => space.commander_action(index)?,
        AgentObservation::Subordinate(_) => space.subordinate_action(index)?,
    };
    Ok(ActionRequest::from_action(&action))
}

fn encode(message: &ClientMessage) -> Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}
