//! Per-entity simulation state and the per-tick inputs and outputs of the
//! simulator.

use glam::{Quat, Vec3};

/// Everything the simulator carries from one tick to the next for a single
/// controlled entity.
///
/// Owned by the entity's simulation slot and only changed by
/// [`MovementSimulator::advance`](crate::MovementSimulator::advance).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KinematicState {
    /// Last strafe axis received.
    pub horizontal_input: f32,
    /// Last forward axis received.
    pub vertical_input: f32,
    pub jump_requested: bool,
    pub sprint_requested: bool,
    /// Crouch flag from the previous input tick. Only a rising edge
    /// toggles crouching.
    pub crouch_toggled: bool,
    pub is_jumping: bool,
    /// Seconds since the current jump started. 0 when not jumping.
    pub jump_elapsed_time: f32,
    pub is_crouching: bool,
    pub is_sprinting: bool,
    /// Vertical displacement produced by the last tick.
    pub vertical_velocity_accumulator: f32,
}

/// Horizontal camera axes used to turn stick input into world motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
}

impl CameraBasis {
    /// A camera looking down +Z with +X to its right.
    pub const WORLD: Self = Self {
        forward: Vec3::Z,
        right: Vec3::X,
    };

    /// A level camera turned `yaw` radians about +Y from [`Self::WORLD`].
    pub fn from_yaw(yaw: f32) -> Self {
        let rotation = Quat::from_rotation_y(yaw);
        Self {
            forward: rotation * Vec3::Z,
            right: rotation * Vec3::X,
        }
    }

    /// Both axes projected onto the ground plane and normalized. A camera
    /// looking straight up or down yields zero vectors.
    pub fn flattened(self) -> Self {
        let flat = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
        Self {
            forward: flat(self.forward),
            right: flat(self.right),
        }
    }
}

impl Default for CameraBasis {
    fn default() -> Self {
        Self::WORLD
    }
}

/// What the simulator needs to know about the world for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Fixed step in seconds.
    pub dt: f32,
    /// Controller grounded state after the previous tick's move.
    pub grounded: bool,
    /// Controller speed after the previous tick's move.
    pub speed: f32,
    /// The upward ceiling probe hit something.
    pub ceiling_blocked: bool,
    pub camera: CameraBasis,
    /// Entity rotation before this tick.
    pub rotation: Quat,
}

impl TickContext {
    /// A grounded, unobstructed tick under the default camera.
    pub fn grounded(dt: f32) -> Self {
        Self {
            dt,
            grounded: true,
            speed: 0.0,
            ceiling_blocked: false,
            camera: CameraBasis::WORLD,
            rotation: Quat::IDENTITY,
        }
    }

    /// An airborne, unobstructed tick under the default camera.
    pub fn airborne(dt: f32) -> Self {
        Self {
            grounded: false,
            ..Self::grounded(dt)
        }
    }
}

/// Animation parameters derived each tick. Never fed back into the
/// simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationFlags {
    pub crouch: bool,
    pub run: bool,
    pub sprint: bool,
    pub air: bool,
}

/// Result of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementStep {
    pub state: KinematicState,
    /// World-space displacement to hand to the character controller.
    pub displacement: Vec3,
    /// Entity rotation after this tick.
    pub rotation: Quat,
    pub animation: AnimationFlags,
}
