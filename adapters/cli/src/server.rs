//! Newline-delimited JSON session server over TCP.
//!
//! Every connection gets a reader task and a writer task. Readers forward
//! decoded lines into one inbound queue drained by a single room loop, so
//! requests are served strictly in arrival order and one at a time.

use std::{collections::HashMap, fmt, time::Instant};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use runtag_core::{ClientMessage, GameConfig, GameSnapshot, ProtocolError, ServerMessage};
use runtag_system_session::{Broadcast, Phase, Room};
use runtag_world::Game;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpListener, TcpStream},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Identity of one accepted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

enum Inbound {
    Connected {
        id: ConnectionId,
        outbox: Outbox,
    },
    Line {
        id: ConnectionId,
        line: String,
    },
    Closed {
        id: ConnectionId,
    },
}

struct Outbox {
    sender: mpsc::UnboundedSender<ServerMessage>,
    writer: JoinHandle<()>,
}

/// Builds a game from `config` and serves it on `listener` until it ends.
///
/// Returns the final snapshot once every client has been sent the terminal
/// broadcast.
pub(crate) async fn serve(listener: TcpListener, config: &GameConfig) -> Result<GameSnapshot> {
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let game = Game::make(config, &mut rng).context("failed to lay out the game")?;
    info!(
        address = %listener.local_addr()?,
        seed,
        slots = config.slot_count(),
        "waiting for agents"
    );
    serve_game(listener, game).await
}

/// Serves an already built game on `listener` until it ends.
pub(crate) async fn serve_game(listener: TcpListener, game: Game) -> Result<GameSnapshot> {
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    let acceptor = tokio::spawn(accept(listener, inbound_tx));

    let mut room = Room::new(game);
    let mut outboxes: HashMap<ConnectionId, Outbox> = HashMap::new();

    let finale = loop {
        let Some(inbound) = inbound_rx.recv().await else {
            anyhow::bail!("listener stopped before the game finished");
        };
        match inbound {
            Inbound::Connected { id, outbox } => {
                debug!(%id, "connection accepted");
                let _ = outboxes.insert(id, outbox);
            }
            Inbound::Closed { id } => {
                warn!(%id, slot = ?room.identity_index(&id), "connection closed");
            }
            Inbound::Line { id, line } => {
                if let Some(finale) = serve_line(&mut room, &outboxes, id, &line) {
                    break finale;
                }
            }
        }
    };

    acceptor.abort();
    for (_, outbox) in outboxes {
        drop(outbox.sender);
        if let Err(error) = outbox.writer.await {
            warn!(%error, "writer task failed");
        }
    }
    Ok(finale)
}

/// Handles one decoded line; returns the final snapshot once the game ends.
fn serve_line(
    room: &mut Room<ConnectionId>,
    outboxes: &HashMap<ConnectionId, Outbox>,
    id: ConnectionId,
    line: &str,
) -> Option<GameSnapshot> {
    let message = match serde_json::from_str::<ClientMessage>(line) {
        Ok(message) => message,
        Err(error) => {
            reject(outboxes, id, &ProtocolError::Malformed(error.to_string()));
            return None;
        }
    };

    match message {
        ClientMessage::Join(affiliation) => {
            match room.join(id, affiliation) {
                Ok(slot) => send(outboxes, id, ServerMessage::Assigned { slot }),
                Err(conflict) => send(
                    outboxes,
                    id,
                    ServerMessage::Rejected {
                        reason: conflict.to_string(),
                    },
                ),
            }
            if room.phase() == Phase::Ready {
                match room.start() {
                    Ok(broadcast) => deliver(outboxes, broadcast),
                    Err(error) => warn!(%error, "room failed to start"),
                }
            }
            None
        }
        ClientMessage::Act(request) => match room.handle(&id, &request, Instant::now()) {
            Ok(turn) => {
                send(
                    outboxes,
                    id,
                    ServerMessage::Snapshot {
                        game: turn.snapshot.clone(),
                    },
                );
                let finished = turn.finished?;
                deliver(outboxes, finished);
                Some(turn.snapshot)
            }
            Err(error) => {
                reject(outboxes, id, &error);
                None
            }
        },
    }
}

fn reject(outboxes: &HashMap<ConnectionId, Outbox>, id: ConnectionId, error: &ProtocolError) {
    send(
        outboxes,
        id,
        ServerMessage::Rejected {
            reason: error.to_string(),
        },
    );
}

fn deliver(outboxes: &HashMap<ConnectionId, Outbox>, broadcast: Broadcast<ConnectionId>) {
    for id in broadcast.recipients {
        send(outboxes, id, broadcast.message.clone());
    }
}

fn send(outboxes: &HashMap<ConnectionId, Outbox>, id: ConnectionId, message: ServerMessage) {
    let delivered = outboxes
        .get(&id)
        .is_some_and(|outbox| outbox.sender.send(message).is_ok());
    if !delivered {
        warn!(%id, "dropping message for a closed connection");
    }
}

async fn accept(listener: TcpListener, inbound: mpsc::UnboundedSender<Inbound>) {
    let mut next_id = 0u64;
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                warn!(%error, "accept failed");
                continue;
            }
        };
        let id = ConnectionId(next_id);
        next_id += 1;
        info!(%id, %peer, "agent connected");
        if connect(id, stream, inbound.clone()).is_err() {
            return;
        }
    }
}

/// Spawns the reader and writer tasks of one connection.
fn connect(
    id: ConnectionId,
    stream: TcpStream,
    inbound: mpsc::UnboundedSender<Inbound>,
) -> Result<(), mpsc::error::SendError<Inbound>> {
    let (reader, writer) = stream.into_split();
    let (sender, receiver) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_messages(id, writer, receiver));
    inbound.send(Inbound::Connected {
        id,
        outbox: Outbox { sender, writer },
    })?;

    drop(tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    if inbound.send(Inbound::Line { id, line }).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    warn!(%id, %error, "read failed");
                    break;
                }
            }
        }
        let _ = inbound.send(Inbound::Closed { id });
    }));
    Ok(())
}

async fn write_messages(
    id: ConnectionId,
    mut writer: OwnedWriteHalf,
    mut outbox: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(message) = outbox.recv().await {
        if let Err(error) = write_line(&mut writer, &message).await {
            warn!(%id, %error, "write failed");
            return;
        }
    }
    let _ = writer.shutdown().await;
}

async fn write_line(writer: &mut OwnedWriteHalf, message: &ServerMessage) -> Result<()> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use runtag_core::{Camp, Position, Rank, Winner};
    use runtag_world::Bootcamp;
    use tokio::net::tcp::OwnedReadHalf;

    use super::*;

    struct Client {
        lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
    }

    impl Client {
        async fn connect(address: std::net::SocketAddr) -> Self {
            let stream = TcpStream::connect(address).await.expect("connect");
            let (reader, writer) = stream.into_split();
            Self {
                lines: BufReader::new(reader).lines(),
                writer,
            }
        }

        async fn send(&mut self, line: &str) {
            self.writer
                .write_all(format!("{line}\n").as_bytes())
                .await
                .expect("send");
        }

        async fn receive(&mut self) -> ServerMessage {
            let line = self
                .lines
                .next_line()
                .await
                .expect("read")
                .expect("server closed the connection");
            serde_json::from_str(&line).expect("server message")
        }
    }

    /// Blue commander at (0, 0) next to the red subordinate at (1, 0).
    fn staged_game() -> Game {
        let mut game = Game::new(3, 3, Duration::from_secs(5));
        let mut bootcamp = Bootcamp::new();
        let blue = bootcamp.recruit(Camp::Blue, 1);
        let red = bootcamp.recruit(Camp::Red, 1);
        game.spawn(blue, Position::new(0, 0), &[Position::new(0, 2)])
            .expect("blue");
        game.spawn(red, Position::new(2, 2), &[Position::new(1, 0)])
            .expect("red");
        game
    }

    #[tokio::test]
    async fn gathers_runs_and_finishes_a_game() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        let server = tokio::spawn(serve_game(listener, staged_game()));

        let joins = [
            (Camp::Red, Rank::Subordinate, 3),
            (Camp::Blue, Rank::Commander, 0),
            (Camp::Red, Rank::Commander, 2),
            (Camp::Blue, Rank::Subordinate, 1),
        ];
        let mut clients = Vec::new();
        for (camp, rank, slot) in joins {
            let mut client = Client::connect(address).await;
            client
                .send(&format!(r#"{{"camp":"{camp}","rank":"{rank}"}}"#))
                .await;
            assert_eq!(client.receive().await, ServerMessage::Assigned { slot });
            clients.push(client);
        }

        let mut late = Client::connect(address).await;
        late.send(r#"{"camp":"blue","rank":"commander"}"#).await;
        assert!(matches!(late.receive().await, ServerMessage::Rejected { .. }));

        for client in &mut clients {
            assert!(matches!(
                client.receive().await,
                ServerMessage::Snapshot { .. }
            ));
        }

        let red_subordinate = &mut clients[0];
        red_subordinate.send(r#"{"action":"observe"}"#).await;
        assert!(matches!(
            red_subordinate.receive().await,
            ServerMessage::Rejected { .. }
        ));

        let blue_commander = &mut clients[1];
        blue_commander
            .send(r#"{"action":"move","parameters":["right"]}"#)
            .await;
        let ServerMessage::Snapshot { game } = blue_commander.receive().await else {
            panic!("expected the post-action snapshot");
        };
        assert!(game.done);

        for client in &mut clients {
            let ServerMessage::Finished { game } = client.receive().await else {
                panic!("expected the terminal broadcast");
            };
            assert_eq!(game.winner, Some(Winner::Red));
        }

        let finale = server.await.expect("server task").expect("server result");
        assert_eq!(finale.winner, Some(Winner::Red));
    }
}
