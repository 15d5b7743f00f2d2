//! The one place transport callbacks are handled.
//!
//! [`NetworkEventDispatcher::handle`] matches every [`TransportEvent`]
//! variant. Lifecycle events update the [`Roster`] or the
//! [`SessionManager`] and raise a narrower [`Notification`]; the rest are
//! observability hooks that only log.

use std::sync::Arc;

use rand::Rng;
use tether_protocol::{
    Codec, DisplayName, EntityId, JsonCodec, PlayerId, ProtocolError, ReliableKey, ReliableMessage,
    ReplicatedTransform, SceneName, SpawnedEntity, TransportEvent, Vec3,
};
use tether_transport::Transport;
use tracing::{debug, info, trace, warn};

use crate::{Notification, ProfileSource, Roster, SessionError, SessionManager};

/// Routes transport events into session state and notifications.
pub struct NetworkEventDispatcher<T: Transport, C: Codec = JsonCodec> {
    manager: Arc<SessionManager<T>>,
    profile: Arc<dyn ProfileSource>,
    codec: C,
    roster: Roster,
    /// The local avatar and the name announced for it.
    announced: Option<(EntityId, DisplayName)>,
}

impl<T: Transport> NetworkEventDispatcher<T, JsonCodec> {
    pub fn new(manager: Arc<SessionManager<T>>, profile: Arc<dyn ProfileSource>) -> Self {
        Self::with_codec(manager, profile, JsonCodec)
    }
}

impl<T: Transport, C: Codec> NetworkEventDispatcher<T, C> {
    pub fn with_codec(
        manager: Arc<SessionManager<T>>,
        profile: Arc<dyn ProfileSource>,
        codec: C,
    ) -> Self {
        Self {
            manager,
            profile,
            codec,
            roster: Roster::new(),
            announced: None,
        }
    }

    pub fn manager(&self) -> &Arc<SessionManager<T>> {
        &self.manager
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    fn transport(&self) -> &T {
        self.manager.transport()
    }

    fn notify(&self, notification: Notification) {
        self.manager.notifier().notify(notification);
    }

    /// Handles one transport callback. Never fails: problems are logged and,
    /// where the user should know, raised as warnings.
    pub async fn handle(&mut self, event: TransportEvent) {
        trace!(kind = event.kind(), "transport event");
        match event {
            TransportEvent::Connected => info!("connected to session server"),
            TransportEvent::ConnectFailed { address, reason } => {
                warn!(%address, %reason, "connection failed");
                self.notify(Notification::warning(format!(
                    "Failed to connect to {address}: {reason}"
                )));
            }
            TransportEvent::ConnectRequest { address } => {
                debug!(%address, "connect request");
            }
            TransportEvent::Disconnected { reason } => {
                warn!(%reason, "disconnected from session server");
            }
            TransportEvent::PlayerJoined { player } => self.on_player_joined(player).await,
            TransportEvent::PlayerLeft { player } => {
                if self.roster.leave(player).is_some() {
                    info!(%player, "participant left");
                    self.notify(Notification::ParticipantLeft { player });
                }
            }
            TransportEvent::InputMissing { player } => {
                trace!(%player, "no input this tick");
            }
            TransportEvent::ObjectEnteredInterest { entity, player } => {
                trace!(%entity, %player, "object entered area of interest");
            }
            TransportEvent::ObjectExitedInterest { entity, player } => {
                trace!(%entity, %player, "object left area of interest");
            }
            TransportEvent::SceneLoadStart => debug!("scene load started"),
            TransportEvent::SceneLoadDone { scene } => self.on_scene_loaded(&scene).await,
            TransportEvent::SessionListUpdated { sessions } => {
                self.manager.on_session_list(sessions).await;
            }
            TransportEvent::Shutdown { reason } => {
                self.manager.on_shutdown(&reason).await;
                self.roster.clear();
                self.announced = None;
            }
            TransportEvent::ReliableDataProgress {
                player,
                key,
                progress,
            } => {
                trace!(%player, %key, progress, "reliable data progress");
            }
            TransportEvent::ReliableDataReceived { player, key, data } => {
                self.on_reliable_data(player, key, &data);
            }
            TransportEvent::HostMigration => {
                info!("host migrated; entity authority stays with the spawning process");
            }
            TransportEvent::CustomAuthResponse { data } => {
                debug!(fields = data.len(), "custom auth response");
            }
            TransportEvent::UserSimulationMessage => trace!("user simulation message"),
            TransportEvent::EntitySpawned(spawned) => self.on_entity_spawned(spawned).await,
            TransportEvent::EntityDespawned { entity } => {
                self.roster.detach_entity(entity);
                if self.announced.as_ref().is_some_and(|(e, _)| *e == entity) {
                    self.announced = None;
                }
                debug!(%entity, "entity despawned");
                self.notify(Notification::EntityDespawned { entity });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    async fn on_player_joined(&mut self, player: PlayerId) {
        let local = self.transport().local_player();
        self.roster.set_local(local);
        if !self.roster.join(player) {
            return;
        }
        info!(%player, "participant joined");
        self.notify(Notification::ParticipantJoined { player });

        // Late joiners missed the spawn-time announcement.
        if Some(player) != local {
            if let Some((entity, name)) = self.announced.clone() {
                if let Err(e) = self.send_display_name(Some(player), entity, name).await {
                    warn!(%player, error = %e, "could not send display name to late joiner");
                }
            }
        }
    }

    async fn on_scene_loaded(&mut self, scene: &SceneName) {
        let config = self.manager.config();
        if *scene != config.gameplay_scene {
            debug!(%scene, "scene loaded");
            return;
        }
        let Some(local) = self.transport().local_player() else {
            warn!(%scene, "gameplay scene loaded without a running session");
            return;
        };
        if let Some(existing) = self.transport().player_object(local) {
            warn!(player = %local, entity = %existing, "player object already exists, not spawning");
            return;
        }

        let position = random_spawn_point(config.spawn_half_extent);
        let prefab = config.player_prefab.clone();
        match self
            .transport()
            .spawn(&prefab, ReplicatedTransform::at(position), local)
            .await
        {
            Ok(entity) => {
                self.transport().set_player_object(local, entity);
                info!(player = %local, %entity, ?position, "local player spawned");
            }
            Err(e) => warn!(player = %local, error = %e, "failed to spawn local player"),
        }
    }

    async fn on_entity_spawned(&mut self, spawned: SpawnedEntity) {
        let SpawnedEntity { entity, owner, .. } = spawned;
        let local = self.transport().local_player();
        self.roster.set_local(local);
        self.roster.attach_entity(owner, entity);
        debug!(%entity, %owner, "entity spawned");
        self.notify(Notification::EntitySpawned { entity, owner });

        if Some(owner) == local {
            self.announce_display_name(owner, entity).await;
        }
    }

    /// Reads the profile once for the local avatar and shares the name.
    async fn announce_display_name(&mut self, local: PlayerId, entity: EntityId) {
        let name = match self.profile.validated_display_name() {
            Ok(name) => name,
            Err(e) => {
                warn!(player = %local, error = %e, "display name rejected, not sent");
                self.notify(Notification::warning("Please enter a username"));
                return;
            }
        };

        self.roster.set_display_name(local, name.clone());
        self.announced = Some((entity, name.clone()));
        self.notify(Notification::DisplayNameSynced {
            player: local,
            name: name.clone(),
        });
        if let Err(e) = self.send_display_name(None, entity, name).await {
            warn!(player = %local, error = %e, "could not send display name");
        }
    }

    async fn send_display_name(
        &self,
        target: Option<PlayerId>,
        entity: EntityId,
        name: DisplayName,
    ) -> Result<(), SessionError> {
        let player = self
            .transport()
            .local_player()
            .ok_or(SessionError::NotInRoom)?;
        let message = ReliableMessage::DisplayName {
            entity,
            player,
            name,
        };
        let bytes = self.codec.encode(&message)?;
        self.transport()
            .send_reliable(target, ReliableKey::SESSION, bytes)
            .await?;
        Ok(())
    }

    fn on_reliable_data(&mut self, from: PlayerId, key: ReliableKey, data: &[u8]) {
        if key != ReliableKey::SESSION {
            trace!(player = %from, %key, bytes = data.len(), "reliable data for another consumer");
            return;
        }
        match self.decode_session_message(from, data) {
            Ok(ReliableMessage::DisplayName {
                entity,
                player,
                name,
            }) => {
                info!(%player, %name, "display name synced");
                self.roster.set_display_name(player, name.clone());
                self.roster.attach_entity(player, entity);
                self.notify(Notification::DisplayNameSynced { player, name });
            }
            Err(e) => warn!(player = %from, error = %e, "reliable data dropped"),
        }
    }

    /// Decodes a session-channel message and checks that the sender only
    /// speaks for itself.
    fn decode_session_message(
        &self,
        from: PlayerId,
        data: &[u8],
    ) -> Result<ReliableMessage, ProtocolError> {
        let message = self.codec.decode::<ReliableMessage>(data)?;
        let claimed = match &message {
            ReliableMessage::DisplayName { player, .. } => *player,
        };
        if claimed != from {
            return Err(ProtocolError::InvalidMessage(format!(
                "display name for {claimed} sent by {from}"
            )));
        }
        Ok(message)
    }
}

fn random_spawn_point(half_extent: f32) -> Vec3 {
    if half_extent <= 0.0 {
        return Vec3::ZERO;
    }
    let mut rng = rand::rng();
    Vec3::new(
        rng.random_range(-half_extent..half_extent),
        0.0,
        rng.random_range(-half_extent..half_extent),
    )
}
