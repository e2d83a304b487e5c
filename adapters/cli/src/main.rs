#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for RunTag: session server, remote agent and local
//! simulation.

mod agent;
mod config;
mod server;
mod simulate;

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use runtag_core::{Camp, Rank};
use tokio::net::TcpListener;
use tracing::info;

/// Two-team grid pursuit game.
#[derive(Parser, Debug)]
#[command(author, version, about = "RunTag session server and agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hosts one game and waits for an agent on every roster slot.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:7878")]
        bind: SocketAddr,
        #[command(flatten)]
        game: GameArgs,
    },
    /// Joins a server and plays one slot with a built-in policy.
    Agent {
        /// Address of the session server.
        #[arg(long, default_value = "127.0.0.1:7878")]
        server: SocketAddr,
        /// Team to play for.
        #[arg(long, value_parser = parse_camp)]
        camp: Camp,
        /// Role to play.
        #[arg(long, value_parser = parse_rank)]
        rank: Rank,
        /// Seed of the policy's random choices.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Plays episodes locally with built-in policies on both sides.
    Simulate {
        /// Number of episodes to play.
        #[arg(long, default_value_t = 1)]
        episodes: u32,
        /// Prints the board after every step.
        #[arg(long)]
        render: bool,
        /// Prints only what this camp's commander last saw; implies `--render`.
        #[arg(long, value_parser = parse_camp)]
        fog: Option<Camp>,
        #[command(flatten)]
        game: GameArgs,
    },
}

/// Game parameters: an optional TOML file plus per-field overrides.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct GameArgs {
    /// TOML file with game parameters.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Number of grid columns.
    #[arg(long)]
    pub(crate) width: Option<u32>,
    /// Number of grid rows.
    #[arg(long)]
    pub(crate) height: Option<u32>,
    /// Subordinates per squad.
    #[arg(long)]
    pub(crate) subordinates: Option<u32>,
    /// Seconds an undelivered order stays in a mailbox.
    #[arg(long)]
    pub(crate) mailbox_ttl_secs: Option<u64>,
    /// Step limit per simulated episode.
    #[arg(long)]
    pub(crate) max_steps: Option<u64>,
    /// Seed for spawn layouts.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    match Cli::parse().command {
        Command::Serve { bind, game } => {
            let config = config::load(&game)?;
            let listener = TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            let finale = server::serve(listener, &config).await?;
            info!(winner = ?finale.winner, "server finished");
        }
        Command::Agent {
            server,
            camp,
            rank,
            seed,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            let finale = agent::play(server, camp, rank, seed).await?;
            info!(winner = ?finale.winner, "agent finished");
        }
        Command::Simulate {
            episodes,
            render,
            fog,
            game,
        } => {
            let config = config::load(&game)?;
            simulate::run(&config, episodes, simulate::renderer(render, fog))?;
        }
    }
    Ok(())
}

fn parse_camp(value: &str) -> Result<Camp, String> {
    Camp::ALL
        .into_iter()
        .find(|camp| camp.name() == value)
        .ok_or_else(|| format!("unknown camp `{value}`, expected blue or red"))
}

fn parse_rank(value: &str) -> Result<Rank, String> {
    [Rank::Commander, Rank::Subordinate]
        .into_iter()
        .find(|rank| rank.name() == value)
        .ok_or_else(|| format!("unknown rank `{value}`, expected commander or subordinate"))
}
