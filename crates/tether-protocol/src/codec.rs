//! Codec trait and implementations for the reliable-data channel.
//!
//! The transport moves opaque bytes. A [`Codec`] turns
//! [`ReliableMessage`](crate::ReliableMessage)s (or any other serde type)
//! into those bytes and back, so the session layer never touches a
//! concrete format directly.
//!
//! [`JsonCodec`] is the only implementation today. A binary codec can be
//! dropped in later through
//! `NetworkEventDispatcher::with_codec` without touching the message
//! types, as long as both ends of a room agree on it.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// ## Trait bounds
///
/// - `Send + Sync`: the codec lives inside the event dispatcher, which the
///   game client drives from whatever Tokio worker thread it lands on.
/// - `'static`: the codec owns everything it needs and borrows nothing
///   from the caller, so it can sit in long-lived state.
///
/// ## Generic methods
///
/// Both methods are generic over the value type. `encode` accepts anything
/// that is `Serialize`; `decode` produces anything that is
/// `DeserializeOwned`, meaning the decoded value owns its data and the
/// input buffer can be dropped right after the call.
///
/// Validation attached to a type's `Deserialize` impl runs inside
/// `decode`. A display name that trims to nothing, an input axis outside
/// `[-1, 1]`, or a rotation that is not unit length is rejected or
/// repaired there, before the value reaches session or movement code.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented
    /// in this format (a map with non-string keys, for JSON).
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// truncated, do not match the shape of `T`, or fail a validation
    /// hook on `T` (see the trait docs).
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, so reliable-data payloads can be read straight out of a
/// packet capture or a log line. The messages on this channel are a few
/// dozen bytes and sent once per join, so the size overhead of JSON does
/// not matter here.
///
/// Behind the `json` feature (on by default). Turning the feature off
/// removes this type, the `serde_json` dependency, and the
/// [`ProtocolError::Encode`]/[`ProtocolError::Decode`] variants.
///
/// ## Example
///
/// ```rust
/// use tether_protocol::{
///     Codec, DisplayName, EntityId, JsonCodec, PlayerId, ReliableMessage,
/// };
///
/// let codec = JsonCodec;
/// let msg = ReliableMessage::DisplayName {
///     entity: EntityId(9),
///     player: PlayerId(1),
///     name: DisplayName::new("Ada").unwrap(),
/// };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: ReliableMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        // Straight to a Vec<u8>; no intermediate String.
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
