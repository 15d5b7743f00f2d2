//! Where the local player's display name comes from.

use rand::Rng;
use tether_protocol::{DisplayName, ProtocolError};

/// Persisted local preferences, read once when the local avatar spawns.
pub trait ProfileSource: Send + Sync {
    /// The stored display name, unvalidated.
    fn display_name(&self) -> Option<String>;

    /// The stored name as a [`DisplayName`].
    ///
    /// # Errors
    /// [`ProtocolError::EmptyDisplayName`] when nothing usable is stored.
    fn validated_display_name(&self) -> Result<DisplayName, ProtocolError> {
        DisplayName::new(self.display_name().unwrap_or_default())
    }
}

/// A profile with a fixed name, or none at all.
#[derive(Debug, Clone, Default)]
pub struct FixedProfile(pub Option<String>);

impl FixedProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self(Some(name.into()))
    }
}

impl ProfileSource for FixedProfile {
    fn display_name(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Suggested name for a player who hasn't picked one: `Player 10` to
/// `Player 99`.
pub fn guest_name() -> DisplayName {
    let n: u32 = rand::rng().random_range(10..100);
    DisplayName::placeholder(tether_protocol::PlayerId(n))
}
