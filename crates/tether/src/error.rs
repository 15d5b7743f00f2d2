//! Unified error type for the Tether client.

use tether_movement::ReplicationError;
use tether_protocol::ProtocolError;
use tether_session::SessionError;
use tether_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// Code built on the `tether` crate handles this one type; `?` converts
/// the layer errors through the `#[from]` impls.
#[derive(Debug, thiserror::Error)]
pub enum TetherError {
    /// A transport request failed (not running, not owner, lobby down).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A reliable-data payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation failed (start failed, pending, cancelled).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A non-authoritative write to a replicated transform.
    #[error(transparent)]
    Replication(#[from] ReplicationError),

    /// The client configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
