//! In-process transport: every participant lives in the same process and
//! shares one [`LocalNetwork`] hub.
//!
//! Behaves like a shared-mode session server closely enough to drive the
//! session and movement layers end to end in tests and the offline demo:
//! rooms fill up, the first member hosts, spawns and scene loads fan out
//! to every member as [`TransportEvent`]s, and replicated transforms can
//! only be written by the owner.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tether_protocol::{
    EntityId, InputSnapshot, PlayerId, PrefabId, ReliableKey, ReplicatedTransform, SceneName,
    SessionInfo, ShutdownReason, SpawnedEntity, TransportEvent,
};
use tokio::sync::mpsc;

use crate::{MatchmakingMode, StartGameArgs, Transport, TransportError};

type EventSender = mpsc::UnboundedSender<TransportEvent>;

// ---------------------------------------------------------------------------
// Hub state
// ---------------------------------------------------------------------------

struct LocalEntity {
    owner: PlayerId,
    prefab: PrefabId,
    transform: ReplicatedTransform,
    /// Input waiting to be polled, one slot per member.
    pending_input: HashMap<PlayerId, InputSnapshot>,
}

struct LocalRoom {
    max_players: u32,
    host: PlayerId,
    /// Members in join order.
    members: Vec<PlayerId>,
    entities: BTreeMap<EntityId, LocalEntity>,
    player_objects: HashMap<PlayerId, EntityId>,
    scene: Option<SceneName>,
}

impl LocalRoom {
    fn info(&self, name: &str) -> SessionInfo {
        SessionInfo::new(name, self.members.len() as u32, self.max_players)
    }
}

#[derive(Default)]
struct Hub {
    next_player: u32,
    next_entity: u64,
    next_room: u32,
    peers: HashMap<PlayerId, EventSender>,
    lobby: HashSet<PlayerId>,
    rooms: BTreeMap<String, LocalRoom>,
    /// Which room each peer is in.
    membership: HashMap<PlayerId, String>,
    lobby_down: bool,
    fail_next_start: Option<ShutdownReason>,
}

impl Hub {
    fn send(&self, player: PlayerId, event: TransportEvent) {
        if let Some(tx) = self.peers.get(&player) {
            let _ = tx.send(event);
        }
    }

    fn broadcast(&self, room: &LocalRoom, event: &TransportEvent) {
        for member in &room.members {
            self.send(*member, event.clone());
        }
    }

    fn room_of(&self, player: PlayerId) -> Option<&LocalRoom> {
        self.membership
            .get(&player)
            .and_then(|name| self.rooms.get(name))
    }

    fn room_of_mut(&mut self, player: PlayerId) -> Option<&mut LocalRoom> {
        let name = self.membership.get(&player)?;
        self.rooms.get_mut(name)
    }

    /// Picks an open room for a nameless start, or names a fresh one.
    fn matchmake(&mut self, mode: MatchmakingMode) -> String {
        let open = self
            .rooms
            .iter()
            .filter(|(_, room)| (room.members.len() as u32) < room.max_players);
        let picked = match mode {
            MatchmakingMode::FillRoom => open.max_by_key(|(_, room)| room.members.len()),
            MatchmakingMode::Serial => open.min_by_key(|(_, room)| room.members.len()),
        };
        if let Some((name, _)) = picked {
            return name.clone();
        }
        self.next_room += 1;
        format!("room-{}", self.next_room)
    }

    fn session_list(&self) -> Vec<SessionInfo> {
        self.rooms
            .iter()
            .map(|(name, room)| room.info(name))
            .collect()
    }

    fn publish_lobby(&self) {
        let sessions = self.session_list();
        for player in &self.lobby {
            self.send(
                *player,
                TransportEvent::SessionListUpdated {
                    sessions: sessions.clone(),
                },
            );
        }
    }

    /// Removes `player` from its room, despawning whatever it still owns.
    fn remove_member(&mut self, player: PlayerId) -> Option<String> {
        let name = self.membership.remove(&player)?;
        let mut despawned = Vec::new();
        let empty = {
            let room = self.rooms.get_mut(&name)?;
            room.members.retain(|m| *m != player);
            room.player_objects.remove(&player);
            room.entities.retain(|id, entity| {
                let keep = entity.owner != player;
                if !keep {
                    despawned.push(*id);
                }
                keep
            });
            room.player_objects
                .retain(|_, entity| !despawned.contains(entity));
            if room.host == player {
                if let Some(next) = room.members.first() {
                    room.host = *next;
                }
            }
            room.members.is_empty()
        };

        if empty {
            self.rooms.remove(&name);
        } else if let Some(room) = self.rooms.get(&name) {
            for entity in &despawned {
                self.broadcast(room, &TransportEvent::EntityDespawned { entity: *entity });
            }
            self.broadcast(room, &TransportEvent::PlayerLeft { player });
        }
        Some(name)
    }
}

// ---------------------------------------------------------------------------
// LocalNetwork
// ---------------------------------------------------------------------------

/// The shared hub that [`LocalTransport`]s connect through.
///
/// Cheap to clone; every clone talks to the same hub.
#[derive(Clone, Default)]
pub struct LocalNetwork {
    hub: Arc<Mutex<Hub>>,
}

impl LocalNetwork {
    /// Creates an empty network with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a new participant. Returns its transport and the receiving
    /// end of its callback stream.
    pub fn connect(&self) -> (LocalTransport, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let player = {
            let mut hub = self.lock();
            hub.next_player += 1;
            let player = PlayerId(hub.next_player);
            hub.peers.insert(player, tx);
            player
        };
        tracing::debug!(%player, "local transport connected");
        (
            LocalTransport {
                network: self.clone(),
                player,
            },
            rx,
        )
    }

    /// Makes every following `join_session_lobby` fail (or succeed again).
    pub fn set_lobby_available(&self, available: bool) {
        self.lock().lobby_down = !available;
    }

    /// Makes the next `start_game` on any transport fail with `reason`.
    pub fn fail_next_start(&self, reason: ShutdownReason) {
        self.lock().fail_next_start = Some(reason);
    }

    /// Ends a room from the server side, sending `reason` to every member.
    pub fn close_room(&self, name: &str, reason: ShutdownReason) {
        let mut hub = self.lock();
        let Some(room) = hub.rooms.remove(name) else {
            return;
        };
        for member in &room.members {
            hub.membership.remove(member);
            hub.send(
                *member,
                TransportEvent::Shutdown {
                    reason: reason.clone(),
                },
            );
        }
        hub.publish_lobby();
        tracing::info!(room = name, %reason, "local room closed by network");
    }

    /// Current room list, as the discovery feed would report it.
    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.lock().session_list()
    }

    fn lock(&self) -> MutexGuard<'_, Hub> {
        self.hub
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// LocalTransport
// ---------------------------------------------------------------------------

/// One participant's view of a [`LocalNetwork`].
pub struct LocalTransport {
    network: LocalNetwork,
    player: PlayerId,
}

impl LocalTransport {
    /// The player id this transport was assigned on connect.
    pub fn player(&self) -> PlayerId {
        self.player
    }
}

impl Transport for LocalTransport {
    async fn join_session_lobby(&self, lobby: &str) -> Result<(), TransportError> {
        let mut hub = self.network.lock();
        if hub.lobby_down {
            return Err(TransportError::LobbyUnavailable(lobby.to_string()));
        }
        hub.lobby.insert(self.player);
        let sessions = hub.session_list();
        hub.send(self.player, TransportEvent::Connected);
        hub.send(self.player, TransportEvent::SessionListUpdated { sessions });
        tracing::debug!(player = %self.player, lobby, "joined local lobby");
        Ok(())
    }

    async fn start_game(&self, args: StartGameArgs) -> Result<(), TransportError> {
        let mut hub = self.network.lock();
        if hub.membership.contains_key(&self.player) {
            return Err(TransportError::AlreadyRunning);
        }
        if let Some(reason) = hub.fail_next_start.take() {
            return Err(TransportError::StartFailed(reason));
        }

        let name = if args.session_name.is_empty() {
            hub.matchmake(args.matchmaking)
        } else {
            args.session_name.clone()
        };
        let created = !hub.rooms.contains_key(&name);
        if created {
            hub.rooms.insert(
                name.clone(),
                LocalRoom {
                    max_players: args.player_count.max(1),
                    host: self.player,
                    members: Vec::new(),
                    entities: BTreeMap::new(),
                    player_objects: HashMap::new(),
                    scene: None,
                },
            );
        }

        let existing = {
            let Some(room) = hub.rooms.get_mut(&name) else {
                return Err(TransportError::StartFailed(ShutdownReason::GameNotFound));
            };
            if room.members.len() as u32 >= room.max_players {
                return Err(TransportError::StartFailed(ShutdownReason::GameIsFull));
            }
            let existing = room.members.clone();
            room.members.push(self.player);
            existing
        };
        hub.membership.insert(self.player, name.clone());
        hub.lobby.remove(&self.player);

        // Existing members hear about the newcomer; the newcomer hears
        // about everyone including itself, then replays the world.
        for member in &existing {
            hub.send(*member, TransportEvent::PlayerJoined { player: self.player });
        }
        hub.send(self.player, TransportEvent::Connected);
        for member in existing.iter().chain(std::iter::once(&self.player)) {
            hub.send(self.player, TransportEvent::PlayerJoined { player: *member });
        }
        if let Some(room) = hub.rooms.get(&name) {
            let replay: Vec<TransportEvent> = room
                .entities
                .iter()
                .map(|(id, entity)| {
                    TransportEvent::EntitySpawned(SpawnedEntity {
                        entity: *id,
                        owner: entity.owner,
                        prefab: entity.prefab.clone(),
                        transform: entity.transform,
                    })
                })
                .collect();
            let scene = room.scene.clone();
            if let Some(scene) = scene {
                hub.send(self.player, TransportEvent::SceneLoadStart);
                hub.send(self.player, TransportEvent::SceneLoadDone { scene });
            }
            for event in replay {
                hub.send(self.player, event);
            }
        }
        hub.publish_lobby();

        tracing::info!(
            player = %self.player,
            room = %name,
            created,
            matchmaking = ?args.matchmaking,
            "local session started"
        );
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        let mut hub = self.network.lock();
        let name = hub
            .remove_member(self.player)
            .ok_or(TransportError::NotRunning)?;
        hub.send(
            self.player,
            TransportEvent::Shutdown {
                reason: ShutdownReason::Ok,
            },
        );
        hub.publish_lobby();
        tracing::info!(player = %self.player, room = %name, "local session shut down");
        Ok(())
    }

    async fn spawn(
        &self,
        prefab: &PrefabId,
        transform: ReplicatedTransform,
        owner: PlayerId,
    ) -> Result<EntityId, TransportError> {
        let mut hub = self.network.lock();
        hub.next_entity += 1;
        let entity = EntityId(hub.next_entity);
        let room = hub
            .room_of_mut(self.player)
            .ok_or(TransportError::NotRunning)?;
        room.entities.insert(
            entity,
            LocalEntity {
                owner,
                prefab: prefab.clone(),
                transform,
                pending_input: HashMap::new(),
            },
        );
        let event = TransportEvent::EntitySpawned(SpawnedEntity {
            entity,
            owner,
            prefab: prefab.clone(),
            transform,
        });
        if let Some(room) = hub.room_of(self.player) {
            hub.broadcast(room, &event);
        }
        Ok(entity)
    }

    async fn despawn(&self, entity: EntityId) -> Result<(), TransportError> {
        let mut hub = self.network.lock();
        let player = self.player;
        let room = hub.room_of_mut(player).ok_or(TransportError::NotRunning)?;
        let owner = room
            .entities
            .get(&entity)
            .map(|e| e.owner)
            .ok_or(TransportError::UnknownEntity(entity))?;
        if owner != player {
            return Err(TransportError::NotOwner(entity));
        }
        room.entities.remove(&entity);
        room.player_objects.retain(|_, e| *e != entity);
        if let Some(room) = hub.room_of(player) {
            hub.broadcast(room, &TransportEvent::EntityDespawned { entity });
        }
        Ok(())
    }

    async fn load_scene(&self, scene: &SceneName) -> Result<(), TransportError> {
        let mut hub = self.network.lock();
        let player = self.player;
        let room = hub.room_of_mut(player).ok_or(TransportError::NotRunning)?;
        if room.host != player {
            return Err(TransportError::NotHost);
        }
        room.scene = Some(scene.clone());
        if let Some(room) = hub.room_of(player) {
            hub.broadcast(room, &TransportEvent::SceneLoadStart);
            hub.broadcast(
                room,
                &TransportEvent::SceneLoadDone {
                    scene: scene.clone(),
                },
            );
        }
        Ok(())
    }

    async fn send_reliable(
        &self,
        target: Option<PlayerId>,
        key: ReliableKey,
        data: Vec<u8>,
    ) -> Result<(), TransportError> {
        let hub = self.network.lock();
        let room = hub.room_of(self.player).ok_or(TransportError::NotRunning)?;
        let event = TransportEvent::ReliableDataReceived {
            player: self.player,
            key,
            data,
        };
        match target {
            Some(target) => hub.send(target, event),
            None => {
                for member in room.members.iter().filter(|m| **m != self.player) {
                    hub.send(*member, event.clone());
                }
            }
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.network.lock().membership.contains_key(&self.player)
    }

    fn is_session_host(&self) -> bool {
        self.network
            .lock()
            .room_of(self.player)
            .is_some_and(|room| room.host == self.player)
    }

    fn local_player(&self) -> Option<PlayerId> {
        self.is_running().then_some(self.player)
    }

    fn active_players(&self) -> Vec<PlayerId> {
        self.network
            .lock()
            .room_of(self.player)
            .map(|room| room.members.clone())
            .unwrap_or_default()
    }

    fn player_object(&self, player: PlayerId) -> Option<EntityId> {
        self.network
            .lock()
            .room_of(self.player)
            .and_then(|room| room.player_objects.get(&player).copied())
    }

    fn set_player_object(&self, player: PlayerId, entity: EntityId) {
        if let Some(room) = self.network.lock().room_of_mut(self.player) {
            room.player_objects.insert(player, entity);
        }
    }

    fn provide_input(&self, input: InputSnapshot) {
        let mut hub = self.network.lock();
        let player = self.player;
        let Some(room) = hub.room_of_mut(player) else {
            return;
        };
        let Some(entity) = room.player_objects.get(&player).copied() else {
            return;
        };
        let members = room.members.clone();
        if let Some(entity) = room.entities.get_mut(&entity) {
            for member in members {
                entity.pending_input.insert(member, input);
            }
        }
    }

    fn poll_input(&self, entity: EntityId) -> Option<InputSnapshot> {
        let mut hub = self.network.lock();
        let player = self.player;
        hub.room_of_mut(player)?
            .entities
            .get_mut(&entity)?
            .pending_input
            .remove(&player)
    }

    fn write_transform(
        &self,
        entity: EntityId,
        transform: ReplicatedTransform,
    ) -> Result<(), TransportError> {
        let mut hub = self.network.lock();
        let player = self.player;
        let room = hub.room_of_mut(player).ok_or(TransportError::NotRunning)?;
        let record = room
            .entities
            .get_mut(&entity)
            .ok_or(TransportError::UnknownEntity(entity))?;
        if record.owner != player {
            return Err(TransportError::NotOwner(entity));
        }
        record.transform = transform;
        Ok(())
    }

    fn read_transform(&self, entity: EntityId) -> Option<ReplicatedTransform> {
        self.network
            .lock()
            .room_of(self.player)
            .and_then(|room| room.entities.get(&entity))
            .map(|e| e.transform)
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        let mut hub = self.network.lock();
        if hub.remove_member(self.player).is_some() {
            hub.publish_lobby();
        }
        hub.lobby.remove(&self.player);
        hub.peers.remove(&self.player);
    }
}
