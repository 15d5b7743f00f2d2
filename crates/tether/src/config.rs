//! Client configuration, loaded from JSON.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tether_movement::MovementConfig;
use tether_session::SessionConfig;
use tether_tick::TickConfig;

/// Errors that can occur while loading a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for [`ClientConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Everything a [`GameClient`](crate::GameClient) needs to run.
///
/// Every section and field is optional; missing values take their
/// defaults.
///
/// ```
/// let cfg = tether::ClientConfig::from_json_str(
///     r#"{ "session": { "lobby_name": "eu" }, "tick": { "tick_rate_hz": 30 } }"#,
/// )
/// .unwrap();
/// assert_eq!(cfg.session.lobby_name, "eu");
/// assert_eq!(cfg.tick.tick_rate_hz, 30);
/// assert_eq!(cfg.movement.base_speed, 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session: SessionConfig,
    pub movement: MovementConfig,
    pub tick: TickConfig,
    /// Default `tracing` filter, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Yaw of the camera in radians. Movement input is relative to it.
    pub camera_yaw: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            movement: MovementConfig::default(),
            tick: TickConfig::default(),
            log_level: "info".to_string(),
            camera_yaw: 0.0,
        }
    }
}

impl ClientConfig {
    /// Parses a config from JSON text and validates every section.
    ///
    /// # Errors
    /// [`ConfigError::Parse`] if the text isn't a valid config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        Ok(config.validated())
    }

    /// Reads and parses a JSON config file.
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file can't be read, [`ConfigError::Parse`]
    /// if its contents aren't a valid config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!(path = %path.display(), "client config loaded");
        Ok(config)
    }

    /// Clamps out-of-range values in every section.
    pub fn validated(self) -> Self {
        let log_level = if self.log_level.trim().is_empty() {
            tracing::warn!("log_level is empty, using info");
            "info".to_string()
        } else {
            self.log_level
        };
        Self {
            session: self.session.validated(),
            movement: self.movement.validated(),
            tick: self.tick.validated(),
            log_level,
            camera_yaw: if self.camera_yaw.is_finite() { self.camera_yaw } else { 0.0 },
        }
    }
}
