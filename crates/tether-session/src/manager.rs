//! Room discovery and lifecycle: lobby, create/join, leave, shutdown.
//!
//! # Concurrency
//!
//! `SessionManager` is shared as an `Arc` between the client loop and
//! whatever drives the UI. Its mutable state sits behind a
//! `tokio::sync::Mutex` that is only ever held for bookkeeping, never
//! across a transport call, so a slow `start_game` can't stall a `leave_room`.
//!
//! A create/join and a leave can overlap. Every `leave_room` bumps a
//! request epoch; a create/join that resolves under an older epoch is
//! thrown away and the session it opened is shut down again.

use std::sync::Arc;

use tether_protocol::{SessionInfo, ShutdownReason};
use tether_transport::{MatchmakingMode, StartGameArgs, Transport};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{Notification, Notifier, SceneLoader, SessionConfig, SessionError};

#[derive(Debug)]
struct ManagerState {
    /// Last list delivered by the discovery feed, unfiltered.
    rooms: Vec<SessionInfo>,
    /// An empty list may trigger one lobby rejoin.
    recovery_armed: bool,
    request_pending: bool,
    epoch: u64,
    current_room: Option<String>,
}

impl Default for ManagerState {
    fn default() -> Self {
        Self {
            rooms: Vec::new(),
            recovery_armed: true,
            request_pending: false,
            epoch: 0,
            current_room: None,
        }
    }
}

/// Owns room discovery, creation, joining, leaving and shutdown reporting.
pub struct SessionManager<T: Transport> {
    transport: Arc<T>,
    config: SessionConfig,
    notifier: Notifier,
    scenes: Arc<dyn SceneLoader>,
    state: Mutex<ManagerState>,
}

impl<T: Transport> SessionManager<T> {
    pub fn new(
        transport: Arc<T>,
        config: SessionConfig,
        notifier: Notifier,
        scenes: Arc<dyn SceneLoader>,
    ) -> Self {
        Self {
            transport,
            config: config.validated(),
            notifier,
            scenes,
            state: Mutex::new(ManagerState::default()),
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    /// Joins the shared discovery lobby. Room lists arrive afterwards as
    /// `SessionListUpdated` events.
    ///
    /// # Errors
    /// [`SessionError::Connection`] if the transport can't reach the lobby.
    /// A warning notification is raised too. There is no automatic retry.
    pub async fn join_lobby(&self) -> Result<(), SessionError> {
        let lobby = &self.config.lobby_name;
        match self.transport.join_session_lobby(lobby).await {
            Ok(()) => {
                info!(lobby = %lobby, "joined discovery lobby");
                Ok(())
            }
            Err(e) => {
                warn!(lobby = %lobby, error = %e, "failed to join discovery lobby");
                self.notifier
                    .notify(Notification::warning(format!("Failed to connect to lobby: {e}")));
                Err(SessionError::Connection(e))
            }
        }
    }

    /// The most recent room list, without rooms that are already full.
    ///
    /// If the last delivered list was empty, rejoins the lobby once as
    /// recovery. Recovery is re-armed by the next non-empty list or by
    /// leaving a room.
    pub async fn list_available_rooms(&self) -> Vec<SessionInfo> {
        let recover = {
            let mut state = self.state.lock().await;
            if !state.rooms.is_empty() {
                return joinable(&state.rooms);
            }
            std::mem::replace(&mut state.recovery_armed, false)
        };

        if recover {
            debug!("room list empty, rejoining lobby");
            // Failure was already reported by join_lobby.
            let _ = self.join_lobby().await;
        }
        Vec::new()
    }

    /// Stores a list delivered by the discovery feed and announces the
    /// joinable part of it.
    pub async fn on_session_list(&self, sessions: Vec<SessionInfo>) {
        let rooms = {
            let mut state = self.state.lock().await;
            if !sessions.is_empty() {
                state.recovery_armed = true;
            }
            state.rooms = sessions;
            joinable(&state.rooms)
        };
        debug!(joinable = rooms.len(), "room list updated");
        self.notifier.notify(Notification::RoomsUpdated { rooms });
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    /// Creates the named room, or joins it if it exists, with the configured
    /// capacity and fill-first matchmaking.
    ///
    /// On success the host asks the transport for the gameplay scene and
    /// `JoinedRoom` is raised. On failure a warning carrying the reason is
    /// raised and nothing else changes.
    ///
    /// # Errors
    /// - [`SessionError::RequestPending`] if another create/join is in flight
    /// - [`SessionError::StartFailed`] if the transport refused
    /// - [`SessionError::Cancelled`] if `leave_room` ran before this resolved
    pub async fn create_or_join_room(&self, name: &str) -> Result<(), SessionError> {
        let epoch = {
            let mut state = self.state.lock().await;
            if state.request_pending {
                return Err(SessionError::RequestPending);
            }
            state.request_pending = true;
            state.epoch
        };

        let args = StartGameArgs {
            session_name: name.to_string(),
            player_count: self.config.target_player_count,
            matchmaking: MatchmakingMode::FillRoom,
        };
        info!(room = %name, capacity = args.player_count, "creating or joining room");
        let result = self.transport.start_game(args).await;

        let cancelled = {
            let mut state = self.state.lock().await;
            state.request_pending = false;
            let cancelled = state.epoch != epoch;
            if result.is_ok() && !cancelled {
                state.current_room = Some(name.to_string());
            }
            cancelled
        };

        if let Err(e) = result {
            warn!(room = %name, error = %e, "failed to start game");
            self.notifier
                .notify(Notification::warning(format!("Failed to start game: {e}")));
            return Err(SessionError::StartFailed(e));
        }

        if cancelled {
            info!(room = %name, "room left before join completed, discarding session");
            if let Err(e) = self.transport.shutdown().await {
                debug!(error = %e, "stray session already gone");
            }
            return Err(SessionError::Cancelled);
        }

        if self.transport.is_session_host() {
            let scene = &self.config.gameplay_scene;
            if let Err(e) = self.transport.load_scene(scene).await {
                warn!(%scene, error = %e, "host could not load gameplay scene");
            }
        }
        self.notifier.notify(Notification::JoinedRoom {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Leaves the current room: despawns every participant's avatar, shuts
    /// the session down, then returns the local view to the lobby scene.
    ///
    /// Without a running session this only logs.
    pub async fn leave_room(&self) {
        {
            let mut state = self.state.lock().await;
            state.epoch += 1;
            state.recovery_armed = true;
        }

        if !self.transport.is_running() {
            warn!("leave_room called with no running session");
            return;
        }

        for player in self.transport.active_players() {
            let Some(entity) = self.transport.player_object(player) else {
                continue;
            };
            match self.transport.despawn(entity).await {
                Ok(()) => debug!(%player, %entity, "avatar despawned"),
                Err(e) => debug!(%player, %entity, error = %e, "avatar not despawned"),
            }
        }

        if let Err(e) = self.transport.shutdown().await {
            warn!(error = %e, "shutdown request failed");
        }
        let room = self.state.lock().await.current_room.take();
        info!(room = ?room, "left room");

        self.scenes.load_scene(&self.config.lobby_scene);
        self.notifier.notify(Notification::LeftRoom);
    }

    /// Reports how the session ended. Anything but `Ok` raises exactly one
    /// warning carrying the reason.
    pub async fn on_shutdown(&self, reason: &ShutdownReason) {
        self.state.lock().await.current_room = None;
        if reason.is_clean() {
            info!("session shut down");
        } else {
            warn!(%reason, "session shut down abnormally");
            self.notifier
                .notify(Notification::warning(format!("Session ended: {reason}")));
        }
    }

    /// Name of the room this process is in, if any.
    pub async fn current_room(&self) -> Option<String> {
        self.state.lock().await.current_room.clone()
    }

    pub async fn is_request_pending(&self) -> bool {
        self.state.lock().await.request_pending
    }
}

fn joinable(rooms: &[SessionInfo]) -> Vec<SessionInfo> {
    rooms.iter().filter(|r| r.is_joinable()).cloned().collect()
}
