//! The transport's callback surface, expressed as data.
//!
//! A transport implementation pushes one [`TransportEvent`] per callback
//! onto a channel; the session layer's dispatcher drains that channel and
//! matches on every variant in one place.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DisplayName, EntityId, PlayerId, PrefabId, ReplicatedTransform, SceneName, SessionInfo};

// ---------------------------------------------------------------------------
// Reasons
// ---------------------------------------------------------------------------

/// Why the transport ended a session.
///
/// `Ok` is the only clean outcome; every other variant is an abnormal
/// termination the user should hear about. `Display` renders the bare
/// variant name (or the raw text for [`ShutdownReason::Other`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownReason {
    Ok,
    Error,
    IncompatibleConfiguration,
    GameClosed,
    GameNotFound,
    GameIsFull,
    MaxCcuReached,
    InvalidRegion,
    InvalidAuthentication,
    AuthenticationTicketExpired,
    AlreadyRunning,
    InvalidArguments,
    HostMigration,
    ConnectionTimeout,
    ConnectionRefused,
    OperationTimeout,
    OperationCanceled,
    /// A code this crate doesn't know by name.
    Other(String),
}

impl ShutdownReason {
    /// `true` only for [`ShutdownReason::Ok`].
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => f.write_str(code),
            named => write!(f, "{named:?}"),
        }
    }
}

/// Why an outgoing connection attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectFailedReason {
    Timeout,
    ServerFull,
    ServerRefused,
}

impl fmt::Display for ConnectFailedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Why an established connection went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    Requested,
    Timeout,
    ServerLogic,
    Unknown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// ---------------------------------------------------------------------------
// Reliable data
// ---------------------------------------------------------------------------

/// Tags a reliable-data transfer so receivers know how to decode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReliableKey(pub u32);

impl ReliableKey {
    /// Transfers carrying a [`ReliableMessage`].
    pub const SESSION: Self = Self(1);
}

impl fmt::Display for ReliableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key-{}", self.0)
    }
}

/// Payloads sent over the transport's reliable-data channel.
///
/// `#[serde(tag = "type")]` gives `{ "type": "DisplayName", ... }` on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReliableMessage {
    /// One-shot sync of the spawning player's display name.
    DisplayName {
        entity: EntityId,
        player: PlayerId,
        name: DisplayName,
    },
}

// ---------------------------------------------------------------------------
// TransportEvent
// ---------------------------------------------------------------------------

/// A networked object that came into existence on this process.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedEntity {
    pub entity: EntityId,
    /// The player that spawned and owns the object.
    pub owner: PlayerId,
    pub prefab: PrefabId,
    /// Transform the object was spawned with.
    pub transform: ReplicatedTransform,
}

/// Every callback the transport can raise.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The transport reached the session server.
    Connected,
    /// An outgoing connection attempt failed.
    ConnectFailed {
        address: String,
        reason: ConnectFailedReason,
    },
    /// A remote peer asked to connect (host-mode transports only).
    ConnectRequest { address: String },
    /// The connection to the session server dropped.
    Disconnected { reason: DisconnectReason },
    /// A participant joined the current session.
    PlayerJoined { player: PlayerId },
    /// A participant left the current session.
    PlayerLeft { player: PlayerId },
    /// No input arrived for `player` this tick.
    InputMissing { player: PlayerId },
    /// An object entered a player's area of interest.
    ObjectEnteredInterest { entity: EntityId, player: PlayerId },
    /// An object left a player's area of interest.
    ObjectExitedInterest { entity: EntityId, player: PlayerId },
    /// A networked scene load began.
    SceneLoadStart,
    /// A networked scene load finished; `scene` is now active.
    SceneLoadDone { scene: SceneName },
    /// The discovery feed delivered a fresh room list.
    SessionListUpdated { sessions: Vec<SessionInfo> },
    /// The session ended.
    Shutdown { reason: ShutdownReason },
    /// Progress of a reliable-data transfer, `0.0..=1.0`.
    ReliableDataProgress {
        player: PlayerId,
        key: ReliableKey,
        progress: f32,
    },
    /// A reliable-data transfer completed.
    ReliableDataReceived {
        player: PlayerId,
        key: ReliableKey,
        data: Vec<u8>,
    },
    /// The session host changed.
    HostMigration,
    /// Response from a custom authentication provider.
    CustomAuthResponse { data: BTreeMap<String, String> },
    /// An opaque simulation message addressed to user code.
    UserSimulationMessage,
    /// A networked object was spawned.
    EntitySpawned(SpawnedEntity),
    /// A networked object was despawned.
    EntityDespawned { entity: EntityId },
}

impl TransportEvent {
    /// Short name of the callback, used as a `tracing` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::ConnectFailed { .. } => "connect_failed",
            Self::ConnectRequest { .. } => "connect_request",
            Self::Disconnected { .. } => "disconnected",
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::InputMissing { .. } => "input_missing",
            Self::ObjectEnteredInterest { .. } => "object_entered_interest",
            Self::ObjectExitedInterest { .. } => "object_exited_interest",
            Self::SceneLoadStart => "scene_load_start",
            Self::SceneLoadDone { .. } => "scene_load_done",
            Self::SessionListUpdated { .. } => "session_list_updated",
            Self::Shutdown { .. } => "shutdown",
            Self::ReliableDataProgress { .. } => "reliable_data_progress",
            Self::ReliableDataReceived { .. } => "reliable_data_received",
            Self::HostMigration => "host_migration",
            Self::CustomAuthResponse { .. } => "custom_auth_response",
            Self::UserSimulationMessage => "user_simulation_message",
            Self::EntitySpawned(_) => "entity_spawned",
            Self::EntityDespawned { .. } => "entity_despawned",
        }
    }
}
