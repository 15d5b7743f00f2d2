//! Error types for the session layer.

use tether_protocol::ProtocolError;
use tether_transport::TransportError;

/// Errors returned by [`SessionManager`](crate::SessionManager) and the
/// dispatcher.
///
/// Every one of these is recoverable. The ones the user should see are
/// also raised as a [`Notification::Warning`](crate::Notification::Warning).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The discovery lobby could not be joined.
    #[error("could not join lobby: {0}")]
    Connection(TransportError),

    /// The transport refused to create or join the room.
    #[error("could not start game: {0}")]
    StartFailed(TransportError),

    /// The room was left while the create/join was in flight; the late
    /// result was discarded.
    #[error("create/join cancelled by leave")]
    Cancelled,

    /// A create/join is already in flight.
    #[error("a create/join request is already pending")]
    RequestPending,

    /// The operation needs a running room.
    #[error("not in a room")]
    NotInRoom,

    /// The locally stored display name is unusable.
    #[error("invalid display name: {0}")]
    InvalidDisplayName(ProtocolError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
