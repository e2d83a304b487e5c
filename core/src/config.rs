//! Episode configuration shared by the server, the environment and the CLI.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_WIDTH: u32 = 8;
const DEFAULT_HEIGHT: u32 = 8;
const DEFAULT_SUBORDINATES: u32 = 2;
const DEFAULT_MAILBOX_TTL_SECS: u64 = 5;

/// Largest number of tiles a configured grid may have.
pub const MAX_TILES: u64 = 1 << 20;

/// Parameters used to build a game episode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of grid columns.
    pub width: u32,
    /// Number of grid rows.
    pub height: u32,
    /// Subordinates recruited into each squad.
    pub subordinates: u32,
    /// Seconds an undelivered order stays in a mailbox.
    pub mailbox_ttl_secs: u64,
    /// Optional cap on environment steps per episode.
    pub max_steps: Option<u64>,
    /// Seed for the placement RNG; random when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            subordinates: DEFAULT_SUBORDINATES,
            mailbox_ttl_secs: DEFAULT_MAILBOX_TTL_SECS,
            max_steps: None,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Creates a configuration for the provided grid and squad size.
    #[must_use]
    pub fn new(width: u32, height: u32, subordinates: u32) -> Self {
        Self {
            width,
            height,
            subordinates,
            ..Self::default()
        }
    }

    /// Mailbox time-to-live as a duration.
    #[must_use]
    pub const fn mailbox_ttl(&self) -> Duration {
        Duration::from_secs(self.mailbox_ttl_secs)
    }

    /// Number of roster slots across both squads.
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        2 * (1 + self.subordinates as usize)
    }

    /// Checks that the configuration describes a playable episode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if u64::from(self.width) * u64::from(self.height) > MAX_TILES {
            return Err(ConfigError::OversizedGrid {
                width: self.width,
                height: self.height,
                limit: MAX_TILES,
            });
        }
        if self.mailbox_ttl_secs == 0 {
            return Err(ConfigError::ZeroTimeToLive);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"width":5}"#).expect("config");
        assert_eq!(config.width, 5);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.mailbox_ttl(), Duration::from_secs(5));
        assert_eq!(config.slot_count(), 6);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let config = GameConfig::new(0, 4, 1);
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyGrid {
                width: 0,
                height: 4
            })
        );
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn oversized_grid_is_rejected_before_allocation() {
        let config: GameConfig =
            serde_json::from_str(r#"{"width":1000000,"height":1000000}"#).expect("config");
        assert_eq!(
            config.validate(),
            Err(ConfigError::OversizedGrid {
                width: 1_000_000,
                height: 1_000_000,
                limit: MAX_TILES,
            })
        );
        assert!(GameConfig::new(1024, 1024, 2).validate().is_ok(), "limit is inclusive");
        assert!(GameConfig::new(1025, 1024, 2).validate().is_err());
    }
}
