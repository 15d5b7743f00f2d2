//! Error types for the protocol layer.
//!
//! Each Tether crate defines its own error enum. A `ProtocolError` always
//! means a record could not be built, encoded or decoded; it never
//! describes a network or session failure. Those live in
//! `TransportError` and `SessionError`; the latter wraps this type where a
//! protocol failure can surface through session calls.

/// Errors raised while building or (de)serializing protocol records.
///
/// The `#[error("...")]` strings are what shows up in log lines and in
/// user-facing warnings, so they stay short and lowercase.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a value into bytes).
    ///
    /// Rare for the records in this crate: every field is a plain number,
    /// string or fixed-size array. The inner `serde_json::Error` is kept
    /// as-is so the log shows exactly what serde rejected.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a value).
    ///
    /// Covers malformed or truncated bytes, missing fields, wrong types,
    /// and payloads that violate a record's own validation, such as a
    /// display name that is empty after trimming.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A display name was empty after trimming.
    ///
    /// Returned by `DisplayName::new` when a name is built in code. The same
    /// check during decoding surfaces as [`ProtocolError::Decode`] instead.
    #[error("display name must not be empty")]
    EmptyDisplayName,

    /// The record decoded cleanly but is not acceptable from its sender.
    ///
    /// The session dispatcher raises this for a display-name message that
    /// names a player other than the one who sent it. The string says who
    /// claimed what, for the log line.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
