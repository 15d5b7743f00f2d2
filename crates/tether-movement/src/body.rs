//! The collaborators the simulator drives or queries: the character
//! controller, the ceiling probe and the input device.

use std::collections::VecDeque;

use glam::{Quat, Vec3};
use tether_protocol::{InputSnapshot, ReplicatedTransform};

// ---------------------------------------------------------------------------
// CharacterBody
// ---------------------------------------------------------------------------

/// A kinematic character controller.
///
/// `move_by` resolves collisions and updates the grounded flag and speed
/// that the next tick reads.
pub trait CharacterBody: Send {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn rotation(&self) -> Quat;
    fn set_rotation(&mut self, rotation: Quat);

    /// Moves by `displacement` over a step of `dt` seconds.
    fn move_by(&mut self, displacement: Vec3, dt: f32);

    /// Touching the ground after the last move.
    fn is_grounded(&self) -> bool;

    /// Speed of the last move in units per second.
    fn speed(&self) -> f32;

    /// Capsule height.
    fn height(&self) -> f32;

    /// World-space centre of the capsule.
    fn capsule_center(&self) -> Vec3;

    fn transform(&self) -> ReplicatedTransform {
        ReplicatedTransform::new(self.position(), self.rotation())
    }

    fn set_transform(&mut self, transform: ReplicatedTransform) {
        self.set_position(transform.position);
        self.set_rotation(transform.rotation);
    }
}

/// A capsule on an infinite flat floor. No walls.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneBody {
    position: Vec3,
    rotation: Quat,
    floor: f32,
    height: f32,
    grounded: bool,
    speed: f32,
}

impl PlaneBody {
    pub const DEFAULT_HEIGHT: f32 = 2.0;

    /// A body standing on a floor at `y = position.y`.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            floor: position.y,
            height: Self::DEFAULT_HEIGHT,
            grounded: true,
            speed: 0.0,
        }
    }

    /// Places the floor at `floor`. The body is grounded only if it
    /// already touches it.
    pub fn with_floor(mut self, floor: f32) -> Self {
        self.floor = floor;
        self.grounded = self.position.y <= floor;
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }
}

impl CharacterBody for PlaneBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    fn move_by(&mut self, displacement: Vec3, dt: f32) {
        let before = self.position;
        let mut after = before + displacement;
        self.grounded = after.y <= self.floor;
        if self.grounded {
            after.y = self.floor;
        }
        self.position = after;
        self.speed = if dt > 0.0 {
            (after - before).length() / dt
        } else {
            0.0
        };
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn capsule_center(&self) -> Vec3 {
        self.position + Vec3::Y * (self.height / 2.0)
    }
}

// ---------------------------------------------------------------------------
// CeilingProbe
// ---------------------------------------------------------------------------

/// Answers whether a ray cast straight up hits anything.
pub trait CeilingProbe {
    fn hits_ceiling(&self, origin: Vec3, reach: f32) -> bool;
}

/// No geometry overhead.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSky;

impl CeilingProbe for OpenSky {
    fn hits_ceiling(&self, _origin: Vec3, _reach: f32) -> bool {
        false
    }
}

/// A flat ceiling at a fixed height.
#[derive(Debug, Clone, Copy)]
pub struct CeilingAt(pub f32);

impl CeilingProbe for CeilingAt {
    fn hits_ceiling(&self, origin: Vec3, reach: f32) -> bool {
        origin.y <= self.0 && origin.y + reach >= self.0
    }
}

impl<F> CeilingProbe for F
where
    F: Fn(Vec3, f32) -> bool,
{
    fn hits_ceiling(&self, origin: Vec3, reach: f32) -> bool {
        self(origin, reach)
    }
}

// ---------------------------------------------------------------------------
// InputSampler
// ---------------------------------------------------------------------------

/// Produces one input snapshot per simulation tick from a device.
pub trait InputSampler: Send {
    fn sample(&mut self) -> InputSnapshot;
}

impl<F> InputSampler for F
where
    F: FnMut() -> InputSnapshot + Send,
{
    fn sample(&mut self) -> InputSnapshot {
        self()
    }
}

/// Plays back a fixed list of snapshots, then reports neutral input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputSnapshot>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputSnapshot>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Appends `input` for `ticks` consecutive ticks.
    pub fn hold(mut self, input: InputSnapshot, ticks: usize) -> Self {
        self.frames.extend(std::iter::repeat_n(input, ticks));
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSampler for ScriptedInput {
    fn sample(&mut self) -> InputSnapshot {
        self.frames.pop_front().unwrap_or_default()
    }
}
