//! The replicated transform record and the authority flag that decides
//! who may write it.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position and orientation of a networked entity.
///
/// Exactly one process (the state-authority holder) writes this record per
/// tick. Every other process copies it onto its local transform.
///
/// The rotation is normalized on construction and on deserialization. A
/// rotation that cannot be normalized (zero length or non-finite) becomes
/// the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireTransform")]
pub struct ReplicatedTransform {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation. Kept normalized.
    pub rotation: Quat,
}

impl ReplicatedTransform {
    /// Creates a transform, normalizing the rotation.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation: unit_rotation(rotation),
        }
    }

    /// A transform at `position` with identity rotation.
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }
}

impl Default for ReplicatedTransform {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

fn unit_rotation(rotation: Quat) -> Quat {
    let length = rotation.length();
    if length.is_finite() && length > f32::EPSILON {
        rotation * length.recip()
    } else {
        Quat::IDENTITY
    }
}

#[derive(Deserialize)]
struct WireTransform {
    position: Vec3,
    rotation: Quat,
}

impl From<WireTransform> for ReplicatedTransform {
    fn from(raw: WireTransform) -> Self {
        Self::new(raw.position, raw.rotation)
    }
}

/// Which side holds state authority over an entity.
///
/// Assigned once when the entity is created and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authority {
    /// This process writes the entity's replicated state.
    Local,
    /// Another process writes it; this process only reads.
    Remote,
}

impl Authority {
    /// `Local` when `owner == local`, else `Remote`.
    pub fn resolve<T: PartialEq>(owner: T, local: T) -> Self {
        if owner == local { Self::Local } else { Self::Remote }
    }

    /// Whether this process is the writer.
    pub fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_rotation() {
        let t = ReplicatedTransform::new(Vec3::ONE, Quat::from_xyzw(0.0, 2.0, 0.0, 0.0));
        assert!((t.rotation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_new_degenerate_rotation_is_identity() {
        let zero = ReplicatedTransform::new(Vec3::ZERO, Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!(zero.rotation, Quat::IDENTITY);
        let nan = ReplicatedTransform::new(Vec3::ZERO, Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0));
        assert_eq!(nan.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_authority_resolve() {
        assert_eq!(Authority::resolve(1, 1), Authority::Local);
        assert_eq!(Authority::resolve(1, 2), Authority::Remote);
        assert!(Authority::Local.is_local());
        assert_eq!(Authority::Remote.to_string(), "remote");
    }
}
