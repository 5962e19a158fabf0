//! Spectator configuration.
//!
//! Loaded from `spectator_config.json`, with `ZAPPY_SPECTATOR_CONFIG_PATH`
//! pointing at an override file.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use crate::components::{Color, DEFAULT_TEAM_PALETTE};

pub const BUILTIN_SPECTATOR_CONFIG: &str = include_str!("data/spectator_config.json");
pub const CONFIG_PATH_ENV: &str = "ZAPPY_SPECTATOR_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpectatorConfig {
    pub connection: ConnectionConfig,
    pub message_log: MessageLogConfig,
    pub animation: AnimationConfig,
    pub team_palette: Vec<Color>,
}

impl Default for SpectatorConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            message_log: MessageLogConfig::default(),
            animation: AnimationConfig::default(),
            team_palette: DEFAULT_TEAM_PALETTE.to_vec(),
        }
    }
}

impl SpectatorConfig {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_SPECTATOR_CONFIG)
            .expect("builtin spectator config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = SpectatorConfig::from_json_str(&contents)?;
        Ok(config)
    }

    /// Team palette, falling back to the default when the configured one is empty.
    pub fn palette(&self) -> Vec<Color> {
        if self.team_palette.is_empty() {
            DEFAULT_TEAM_PALETTE.to_vec()
        } else {
            self.team_palette.clone()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub handshake_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: 5_000,
            poll_interval_ms: 10,
        }
    }
}

impl ConnectionConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageLogConfig {
    pub ceiling: usize,
    pub eviction_batch: usize,
}

impl Default for MessageLogConfig {
    fn default() -> Self {
        Self {
            ceiling: 1_000,
            eviction_batch: 100,
        }
    }
}

/// Queue bound and suggested on-screen durations for animation cues.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub queue_limit: usize,
    pub broadcast_secs: f32,
    pub incantation_secs: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            queue_limit: 256,
            broadcast_secs: 1.0,
            incantation_secs: 2.0,
        }
    }
}

impl AnimationConfig {
    pub fn broadcast_duration(&self) -> Duration {
        seconds(self.broadcast_secs)
    }

    pub fn incantation_duration(&self) -> Duration {
        seconds(self.incantation_secs)
    }
}

fn seconds(value: f32) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f32(value)
    } else {
        Duration::ZERO
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse spectator config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read spectator config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load the configuration named by the environment, falling back to the
/// builtin file. Returns the path that was used, if any.
pub fn load_spectator_config_from_env() -> (SpectatorConfig, Option<PathBuf>) {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) {
        match SpectatorConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "zappy::config",
                    path = %path.display(),
                    "spectator_config.loaded=file"
                );
                return (config, Some(path));
            }
            Err(err) => {
                tracing::warn!(
                    target: "zappy::config",
                    path = %path.display(),
                    error = %err,
                    "spectator_config.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "zappy::config", "spectator_config.loaded=builtin");
    (SpectatorConfig::builtin(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_parses() {
        let config = SpectatorConfig::builtin();
        assert_eq!(config.message_log.ceiling, 1_000);
        assert_eq!(config.message_log.eviction_batch, 100);
        assert_eq!(config.palette().len(), DEFAULT_TEAM_PALETTE.len());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            SpectatorConfig::from_json_str(r#"{ "message_log": { "ceiling": 10 } }"#).unwrap();
        assert_eq!(config.message_log.ceiling, 10);
        assert_eq!(config.message_log.eviction_batch, 100);
        assert_eq!(config.connection.poll_interval(), Duration::from_millis(10));
    }

    #[test]
    fn empty_palette_falls_back_to_default() {
        let config = SpectatorConfig::from_json_str(r#"{ "team_palette": [] }"#).unwrap();
        assert_eq!(config.palette(), DEFAULT_TEAM_PALETTE.to_vec());
    }

    #[test]
    fn nonsense_durations_clamp_to_zero() {
        let animation = AnimationConfig {
            broadcast_secs: -3.0,
            incantation_secs: f32::NAN,
            ..AnimationConfig::default()
        };
        assert_eq!(animation.broadcast_duration(), Duration::ZERO);
        assert_eq!(animation.incantation_duration(), Duration::ZERO);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SpectatorConfig::from_file(Path::new("/nonexistent/spectator.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/spectator.json"));
    }
}
