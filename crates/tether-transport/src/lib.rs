//! Transport capability for Tether.
//!
//! Tether doesn't implement networking. It calls into whatever session
//! transport the game ships with through the [`Transport`] trait, and it
//! hears back through a stream of
//! [`TransportEvent`](tether_protocol::TransportEvent)s.
//!
//! The trait has two halves:
//!
//! - **Session requests** (`async`): join the lobby, start/join a room,
//!   spawn, despawn, load a scene, shut down. These may take network
//!   round-trips and are never awaited on the simulation tick.
//! - **Tick accessors** (sync): input and replicated transforms for the
//!   current tick. These must answer from local state immediately.
//!
//! # Feature Flags
//!
//! - `local` (default): [`LocalTransport`], an in-process transport used
//!   by tests and the offline demo.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "local")]
mod local;

pub use error::TransportError;
#[cfg(feature = "local")]
pub use local::{LocalNetwork, LocalTransport};

use tether_protocol::{
    EntityId, InputSnapshot, PlayerId, PrefabId, ReliableKey, ReplicatedTransform, SceneName,
};

/// How a start without a session name picks among open rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchmakingMode {
    /// Prefer the fullest room that still has a slot.
    #[default]
    FillRoom,
    /// Prefer the emptiest room.
    Serial,
}

/// Arguments for [`Transport::start_game`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartGameArgs {
    /// Room to create, or join if it already exists. Empty joins any room
    /// with a free slot, chosen by `matchmaking`, and creates one if none
    /// is open.
    pub session_name: String,
    /// Capacity used when the room has to be created.
    pub player_count: u32,
    pub matchmaking: MatchmakingMode,
}

/// The session transport the core calls into.
///
/// `Send + Sync + 'static` so a transport can be held in an `Arc` by the
/// session manager, the dispatcher, and the game client at once.
pub trait Transport: Send + Sync + 'static {
    // -- Session requests ------------------------------------------------

    /// Connects to the shared discovery lobby. Room lists arrive later as
    /// `SessionListUpdated` events.
    async fn join_session_lobby(&self, lobby: &str) -> Result<(), TransportError>;

    /// Creates the named room, or joins it if it already exists.
    async fn start_game(&self, args: StartGameArgs) -> Result<(), TransportError>;

    /// Leaves the current session. A `Shutdown` event follows.
    async fn shutdown(&self) -> Result<(), TransportError>;

    /// Spawns a networked object owned by `owner`.
    async fn spawn(
        &self,
        prefab: &PrefabId,
        transform: ReplicatedTransform,
        owner: PlayerId,
    ) -> Result<EntityId, TransportError>;

    /// Despawns a networked object.
    async fn despawn(&self, entity: EntityId) -> Result<(), TransportError>;

    /// Loads a scene for every participant. Host only.
    async fn load_scene(&self, scene: &SceneName) -> Result<(), TransportError>;

    /// Sends bytes over the reliable-data channel. `target == None`
    /// sends to every other participant.
    async fn send_reliable(
        &self,
        target: Option<PlayerId>,
        key: ReliableKey,
        data: Vec<u8>,
    ) -> Result<(), TransportError>;

    // -- Session state ---------------------------------------------------

    /// Whether a session is currently running.
    fn is_running(&self) -> bool;

    /// Whether this process is the session host (master client).
    fn is_session_host(&self) -> bool;

    /// This process's player, once a session is running.
    fn local_player(&self) -> Option<PlayerId>;

    /// Every participant in the current session.
    fn active_players(&self) -> Vec<PlayerId>;

    /// The object registered as `player`'s avatar.
    fn player_object(&self, player: PlayerId) -> Option<EntityId>;

    /// Registers `entity` as `player`'s avatar.
    fn set_player_object(&self, player: PlayerId, entity: EntityId);

    // -- Tick accessors --------------------------------------------------

    /// Submits this tick's input for the local player's avatar.
    fn provide_input(&self, input: InputSnapshot);

    /// Takes this tick's input for `entity`, if any arrived.
    fn poll_input(&self, entity: EntityId) -> Option<InputSnapshot>;

    /// Writes the replicated transform. State-authority holder only.
    fn write_transform(
        &self,
        entity: EntityId,
        transform: ReplicatedTransform,
    ) -> Result<(), TransportError>;

    /// Reads the latest replicated transform for `entity`.
    fn read_transform(&self, entity: EntityId) -> Option<ReplicatedTransform>;
}
