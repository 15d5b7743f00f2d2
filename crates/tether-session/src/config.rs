//! Session-layer configuration.

use serde::Deserialize;
use tether_protocol::{PrefabId, SceneName};
use tracing::warn;

/// Names and numbers the session layer needs to run a room.
///
/// Every field is optional when deserializing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Discovery lobby joined by `join_lobby`.
    pub lobby_name: String,
    /// Capacity requested when a room has to be created.
    pub target_player_count: u32,
    /// Scene the host loads once a room is joined. Reaching it spawns the
    /// local player.
    pub gameplay_scene: SceneName,
    /// Scene the local view returns to after leaving.
    pub lobby_scene: SceneName,
    /// Prefab spawned as each participant's avatar.
    pub player_prefab: PrefabId,
    /// Players spawn uniformly in `[-e, e)` on X and Z.
    pub spawn_half_extent: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lobby_name: "default".to_string(),
            target_player_count: 2,
            gameplay_scene: SceneName::new("GameScene"),
            lobby_scene: SceneName::new("LobbyScene"),
            player_prefab: PrefabId::new("Player"),
            spawn_half_extent: 5.0,
        }
    }
}

impl SessionConfig {
    /// Fixes values the session layer can't use, warning about each.
    pub fn validated(mut self) -> Self {
        if self.target_player_count == 0 {
            warn!("target_player_count is 0, using 1");
            self.target_player_count = 1;
        }
        if !(self.spawn_half_extent.is_finite() && self.spawn_half_extent >= 0.0) {
            warn!(
                value = self.spawn_half_extent,
                "spawn_half_extent must be finite and non-negative, using 0"
            );
            self.spawn_half_extent = 0.0;
        }
        self
    }
}
