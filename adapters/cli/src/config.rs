//! Game configuration: TOML file first, command-line overrides second.

use std::fs;

use anyhow::{Context, Result};
use runtag_core::GameConfig;

use crate::GameArgs;

/// Builds the game configuration described by `args`.
pub(crate) fn load(args: &GameArgs) -> Result<GameConfig> {
    let base = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            parse(&contents).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    let config = apply_overrides(base, args);
    config
        .validate()
        .context("game configuration is not playable")?;
    Ok(config)
}

fn parse(contents: &str) -> Result<GameConfig> {
    toml::from_str(contents).context("failed to parse game config toml contents")
}

fn apply_overrides(mut config: GameConfig, args: &GameArgs) -> GameConfig {
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(subordinates) = args.subordinates {
        config.subordinates = subordinates;
    }
    if let Some(ttl) = args.mailbox_ttl_secs {
        config.mailbox_ttl_secs = ttl;
    }
    if args.max_steps.is_some() {
        config.max_steps = args.max_steps;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_are_overridden_by_flags() {
        let file = parse("width = 12\nheight = 9\nseed = 4\n").expect("toml");
        let args = GameArgs {
            height: Some(5),
            ..GameArgs::default()
        };
        let config = apply_overrides(file, &args);

        assert_eq!(config.width, 12);
        assert_eq!(config.height, 5);
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.subordinates, 2, "unspecified fields keep defaults");
    }

    #[test]
    fn unplayable_configs_are_rejected() {
        let args = GameArgs {
            width: Some(0),
            ..GameArgs::default()
        };
        let error = load(&args).expect_err("zero width");
        assert!(error.to_string().contains("not playable"));
    }

    #[test]
    fn oversized_grids_are_rejected() {
        let args = GameArgs {
            width: Some(1_000_000),
            height: Some(1_000_000),
            ..GameArgs::default()
        };
        let error = load(&args).expect_err("too many tiles");
        assert!(format!("{error:#}").contains("exceeds the limit"));
    }

    #[test]
    fn unknown_types_fail_to_parse() {
        assert!(parse("width = \"wide\"").is_err());
    }
}
