//! Shared fixtures for the session-layer tests.

#![allow(dead_code)]

use std::sync::Arc;

use tether_protocol::{
    EntityId, InputSnapshot, PlayerId, PrefabId, ReliableKey, ReplicatedTransform, SceneName,
    TransportEvent,
};
use tether_session::{
    FixedProfile, NetworkEventDispatcher, Notification, Notifier, RecordingSceneLoader,
    SessionConfig, SessionManager, Subscription,
};
use tether_transport::{LocalNetwork, LocalTransport, StartGameArgs, Transport, TransportError};
use tokio::sync::{Semaphore, mpsc::UnboundedReceiver};

// ---------------------------------------------------------------------------
// GatedTransport
// ---------------------------------------------------------------------------

/// A [`LocalTransport`] whose `start_game` waits for a permit, so tests
/// can interleave other calls while a create/join is in flight.
pub struct GatedTransport {
    pub inner: LocalTransport,
    pub gate: Semaphore,
}

impl GatedTransport {
    pub fn open(&self) {
        self.gate.add_permits(1);
    }
}

impl Transport for GatedTransport {
    async fn join_session_lobby(&self, lobby: &str) -> Result<(), TransportError> {
        self.inner.join_session_lobby(lobby).await
    }

    async fn start_game(&self, args: StartGameArgs) -> Result<(), TransportError> {
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.inner.start_game(args).await
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        self.inner.shutdown().await
    }

    async fn spawn(
        &self,
        prefab: &PrefabId,
        transform: ReplicatedTransform,
        owner: PlayerId,
    ) -> Result<EntityId, TransportError> {
        self.inner.spawn(prefab, transform, owner).await
    }

    async fn despawn(&self, entity: EntityId) -> Result<(), TransportError> {
        self.inner.despawn(entity).await
    }

    async fn load_scene(&self, scene: &SceneName) -> Result<(), TransportError> {
        self.inner.load_scene(scene).await
    }

    async fn send_reliable(
        &self,
        target: Option<PlayerId>,
        key: ReliableKey,
        data: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.inner.send_reliable(target, key, data).await
    }

    fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    fn is_session_host(&self) -> bool {
        self.inner.is_session_host()
    }

    fn local_player(&self) -> Option<PlayerId> {
        self.inner.local_player()
    }

    fn active_players(&self) -> Vec<PlayerId> {
        self.inner.active_players()
    }

    fn player_object(&self, player: PlayerId) -> Option<EntityId> {
        self.inner.player_object(player)
    }

    fn set_player_object(&self, player: PlayerId, entity: EntityId) {
        self.inner.set_player_object(player, entity)
    }

    fn provide_input(&self, input: InputSnapshot) {
        self.inner.provide_input(input)
    }

    fn poll_input(&self, entity: EntityId) -> Option<InputSnapshot> {
        self.inner.poll_input(entity)
    }

    fn write_transform(
        &self,
        entity: EntityId,
        transform: ReplicatedTransform,
    ) -> Result<(), TransportError> {
        self.inner.write_transform(entity, transform)
    }

    fn read_transform(&self, entity: EntityId) -> Option<ReplicatedTransform> {
        self.inner.read_transform(entity)
    }
}

// ---------------------------------------------------------------------------
// Peer
// ---------------------------------------------------------------------------

/// One client process: transport, manager, dispatcher, and the queues a
/// test inspects.
pub struct Peer<T: Transport> {
    pub manager: Arc<SessionManager<T>>,
    pub dispatcher: NetworkEventDispatcher<T>,
    pub events: UnboundedReceiver<TransportEvent>,
    pub notes: Subscription,
    pub scenes: Arc<RecordingSceneLoader>,
}

pub fn peer(net: &LocalNetwork, name: Option<&str>) -> Peer<LocalTransport> {
    let (transport, events) = net.connect();
    build(transport, events, name)
}

pub fn gated_peer(net: &LocalNetwork, name: Option<&str>) -> Peer<GatedTransport> {
    let (inner, events) = net.connect();
    let transport = GatedTransport {
        inner,
        gate: Semaphore::new(0),
    };
    build(transport, events, name)
}

fn build<T: Transport>(
    transport: T,
    events: UnboundedReceiver<TransportEvent>,
    name: Option<&str>,
) -> Peer<T> {
    let notifier = Notifier::new();
    let notes = notifier.subscribe();
    let scenes = Arc::new(RecordingSceneLoader::new());
    let manager = Arc::new(SessionManager::new(
        Arc::new(transport),
        SessionConfig::default(),
        notifier,
        scenes.clone(),
    ));
    let profile = Arc::new(FixedProfile(name.map(str::to_string)));
    let dispatcher = NetworkEventDispatcher::new(manager.clone(), profile);
    Peer {
        manager,
        dispatcher,
        events,
        notes,
        scenes,
    }
}

impl<T: Transport> Peer<T> {
    pub fn transport(&self) -> &T {
        self.manager.transport()
    }

    /// Feeds every queued transport event through the dispatcher,
    /// including ones raised while handling. Returns the event kinds seen.
    pub async fn pump(&mut self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            kinds.push(event.kind());
            self.dispatcher.handle(event).await;
        }
        kinds
    }

    pub fn warnings(&mut self) -> Vec<String> {
        self.notes
            .drain()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Warning { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}
