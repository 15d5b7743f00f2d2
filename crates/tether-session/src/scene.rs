//! The local scene-loading hook.

use std::sync::Mutex;

use tether_protocol::SceneName;

/// Loads a scene in the local view only, outside the networked session.
///
/// The lobby scene after leaving a room goes through here. Gameplay scenes
/// are loaded for everyone through the transport instead.
pub trait SceneLoader: Send + Sync {
    fn load_scene(&self, scene: &SceneName);
}

/// Remembers every requested scene without loading anything.
#[derive(Debug, Default)]
pub struct RecordingSceneLoader {
    loaded: Mutex<Vec<SceneName>>,
}

impl RecordingSceneLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scenes requested so far, oldest first.
    pub fn loaded(&self) -> Vec<SceneName> {
        self.loaded
            .lock()
            .map(|scenes| scenes.clone())
            .unwrap_or_default()
    }
}

impl SceneLoader for RecordingSceneLoader {
    fn load_scene(&self, scene: &SceneName) {
        tracing::debug!(%scene, "local scene requested");
        if let Ok(mut scenes) = self.loaded.lock() {
            scenes.push(scene.clone());
        }
    }
}
