//! Identity and session records shared by every Tether layer.
//!
//! Everything here is plain data. Nothing in this module knows about
//! connections, ticks, or rooms; it only names things so the layers
//! above can talk about them without mixing up raw integers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A participant in a shared session, as numbered by the transport.
///
/// Newtype over the transport's player index so a `PlayerId` can never be
/// passed where an [`EntityId`] is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

/// Renders as `P-7`, which keeps `tracing` fields short.
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Handle to a networked object spawned through the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

/// Identifies which prefab the transport should instantiate on spawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabId(pub String);

impl PrefabId {
    /// Creates a prefab id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PrefabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a scene the transport or the local view can load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneName(pub String);

impl SceneName {
    /// Creates a scene name from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the scene name as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// DisplayName
// ---------------------------------------------------------------------------

/// A validated, non-empty player display name.
///
/// Construction trims surrounding whitespace and rejects what is left if
/// it is empty. Holding a `DisplayName` is proof the check already ran, so
/// nothing downstream has to re-validate before sending it anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validates and wraps a display name.
    ///
    /// # Errors
    /// Returns [`ProtocolError::EmptyDisplayName`] if the trimmed input is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, ProtocolError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::EmptyDisplayName);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The placeholder shown for a participant whose name hasn't synced yet.
    pub fn placeholder(player: PlayerId) -> Self {
        Self(format!("Player {}", player.0))
    }

    /// Borrows the name as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionInfo
// ---------------------------------------------------------------------------

/// One entry of the discovery feed: a room somebody can try to join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Room name. Also the key used by create-or-join.
    pub name: String,
    /// Participants currently in the room.
    pub player_count: u32,
    /// Capacity of the room.
    pub max_players: u32,
}

impl SessionInfo {
    /// Creates a session record.
    pub fn new(name: impl Into<String>, player_count: u32, max_players: u32) -> Self {
        Self {
            name: name.into(),
            player_count,
            max_players,
        }
    }

    /// `true` while there is at least one free slot.
    pub fn is_joinable(&self) -> bool {
        self.player_count < self.max_players
    }
}

impl fmt::Display for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.player_count, self.max_players)
    }
}
