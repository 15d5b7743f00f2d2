use tether_protocol::{EntityId, ShutdownReason};

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The operation needs a running session and there is none.
    #[error("no session is running")]
    NotRunning,

    /// A session is already running on this transport.
    #[error("a session is already running")]
    AlreadyRunning,

    /// Starting or joining a session failed.
    #[error("start failed: {0}")]
    StartFailed(ShutdownReason),

    /// The discovery lobby could not be reached.
    #[error("lobby unavailable: {0}")]
    LobbyUnavailable(String),

    /// The entity doesn't exist in the current session.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// Only the state-authority holder may do this to the entity.
    #[error("no state authority over entity {0}")]
    NotOwner(EntityId),

    /// Only the session host may do this.
    #[error("only the session host may do this")]
    NotHost,
}
