//! Local episodes with built-in policies on both sides.

use anyhow::{Context, Result};
use runtag_core::{Camp, GameConfig, Winner};
use runtag_rendering::{TextRenderer, View};
use runtag_system_environment::{Environment, Policy, SquadPolicy};
use tracing::info;

/// Step cap applied when the configuration leaves episodes unbounded.
const DEFAULT_STEP_LIMIT: u64 = 10_000;

/// Outcome of one simulated episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Episode {
    /// Steps applied before the episode ended.
    pub(crate) steps: u64,
    /// Winning side, `None` when the step limit ended the episode.
    pub(crate) winner: Option<Winner>,
}

/// Board printer selected by the `--render` and `--fog` flags.
pub(crate) fn renderer(render: bool, fog: Option<Camp>) -> Option<TextRenderer> {
    match fog {
        Some(camp) => Some(TextRenderer::new(View::Fog(camp))),
        None => render.then(TextRenderer::default),
    }
}

/// Plays `episodes` episodes and logs each outcome.
pub(crate) fn run(
    config: &GameConfig,
    episodes: u32,
    renderer: Option<TextRenderer>,
) -> Result<()> {
    let seed = config.seed.unwrap_or_else(rand::random);
    let config = GameConfig {
        max_steps: Some(config.max_steps.unwrap_or(DEFAULT_STEP_LIMIT)),
        ..config.clone()
    };
    let mut environment = Environment::new(config, seed);
    let mut policy = SquadPolicy::new(environment.space(), seed);

    for episode in 1..=episodes {
        let outcome = play(&mut environment, &mut policy, renderer.as_ref())
            .with_context(|| format!("episode {episode} failed"))?;
        info!(
            episode,
            steps = outcome.steps,
            winner = ?outcome.winner,
            "episode finished"
        );
    }
    Ok(())
}

/// Plays one episode until a side wins or the step limit is exceeded.
pub(crate) fn play(
    environment: &mut Environment,
    policy: &mut impl Policy,
    renderer: Option<&TextRenderer>,
) -> Result<Episode> {
    let mut observations = environment.reset()?;
    loop {
        if let Some(renderer) = renderer {
            println!("{}", renderer.render(&environment.snapshot()?)?);
        }
        let actions: Vec<usize> = observations.iter().map(|o| policy.act(o)).collect();
        let step = environment.step(&actions)?;
        if step.exceeded || step.dones.iter().all(|done| *done) {
            let snapshot = environment.snapshot()?;
            return Ok(Episode {
                steps: environment.steps(),
                winner: snapshot.winner,
            });
        }
        observations = step.observations;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episodes_end_with_a_winner_or_at_the_limit() {
        let config = GameConfig {
            max_steps: Some(50),
            ..GameConfig::new(5, 5, 1)
        };
        let mut environment = Environment::new(config, 13);
        let mut policy = SquadPolicy::new(environment.space(), 13);

        let episode = play(&mut environment, &mut policy, None).expect("episode");
        assert!(episode.steps <= 50);
        if episode.steps < 50 {
            assert!(episode.winner.is_some());
        }
    }

    #[test]
    fn unbounded_configs_still_terminate() {
        let config = GameConfig {
            seed: Some(2),
            max_steps: None,
            ..GameConfig::new(4, 4, 1)
        };
        assert!(run(&config, 2, None).is_ok());
    }

    #[test]
    fn fog_selects_the_camp_view_even_without_render() {
        assert_eq!(renderer(false, None), None);
        assert_eq!(renderer(true, None), Some(TextRenderer::default()));
        assert_eq!(
            renderer(false, Some(Camp::Red)),
            Some(TextRenderer::new(View::Fog(Camp::Red)))
        );
    }

    #[test]
    fn fog_rendered_episodes_play_through() {
        let config = GameConfig {
            max_steps: Some(5),
            ..GameConfig::new(4, 4, 1)
        };
        let mut environment = Environment::new(config, 3);
        let mut policy = SquadPolicy::new(environment.space(), 3);
        let fog = renderer(false, Some(Camp::Blue));

        let episode = play(&mut environment, &mut policy, fog.as_ref()).expect("episode");
        assert!(episode.steps <= 5);
    }
}
