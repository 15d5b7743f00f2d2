//! Shared vocabulary for Tether.
//!
//! This crate defines the records every other layer passes around:
//!
//! - **Identities** ([`PlayerId`], [`EntityId`], [`PrefabId`], [`SceneName`])
//! - **Session records** ([`SessionInfo`], [`DisplayName`])
//! - **Replicated state** ([`InputSnapshot`], [`ReplicatedTransform`], [`Authority`])
//! - **Transport callbacks** ([`TransportEvent`] and its reason enums)
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) for the reliable-data channel
//!
//! ```text
//! Transport (events, bytes) → Protocol (records) → Session / Movement
//! ```

mod codec;
mod error;
mod event;
mod input;
mod transform;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{
    ConnectFailedReason, DisconnectReason, ReliableKey, ReliableMessage, ShutdownReason,
    SpawnedEntity, TransportEvent,
};
pub use input::InputSnapshot;
pub use transform::{Authority, ReplicatedTransform};
pub use types::{DisplayName, EntityId, PlayerId, PrefabId, SceneName, SessionInfo};

/// Re-exported so downstream crates agree on one vector-math version.
pub use glam::{Quat, Vec3};
