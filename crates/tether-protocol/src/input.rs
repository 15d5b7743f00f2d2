//! Per-tick player input as it travels from the input-authority holder
//! to every process simulating the entity.

use serde::{Deserialize, Serialize};

/// One tick's worth of input for a single controlled entity.
///
/// Axes are kept in `[-1, 1]`: [`InputSnapshot::new`] clamps them, and so
/// does deserialization, so a peer cannot send an oversized axis. The
/// fields stay public; code that fills them by hand should pass the
/// snapshot through [`InputSnapshot::clamped`].
///
/// `crouch_edge` is the only edge-style flag: the sampler sets it on the
/// tick the crouch key went down. The other buttons are levels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "WireInput")]
pub struct InputSnapshot {
    /// Strafe axis, right positive.
    pub horizontal: f32,
    /// Forward axis, forward positive.
    pub vertical: f32,
    /// Jump button held.
    pub jump: bool,
    /// Crouch key newly pressed this tick.
    pub crouch_edge: bool,
    /// Sprint button held.
    pub sprint: bool,
}

impl InputSnapshot {
    /// Builds a snapshot from raw axis values, clamping them into range.
    ///
    /// Non-finite axis values are treated as centred (0.0).
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal: clamp_axis(horizontal),
            vertical: clamp_axis(vertical),
            ..Self::default()
        }
    }

    /// The same snapshot with both axes forced back into `[-1, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            horizontal: clamp_axis(self.horizontal),
            vertical: clamp_axis(self.vertical),
            ..self
        }
    }

    /// Sets the jump button.
    pub fn with_jump(mut self, jump: bool) -> Self {
        self.jump = jump;
        self
    }

    /// Sets the crouch edge flag.
    pub fn with_crouch_edge(mut self, crouch_edge: bool) -> Self {
        self.crouch_edge = crouch_edge;
        self
    }

    /// Sets the sprint button.
    pub fn with_sprint(mut self, sprint: bool) -> Self {
        self.sprint = sprint;
        self
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Unchecked field layout as it arrives off the wire.
#[derive(Deserialize)]
struct WireInput {
    horizontal: f32,
    vertical: f32,
    jump: bool,
    crouch_edge: bool,
    sprint: bool,
}

impl From<WireInput> for InputSnapshot {
    fn from(raw: WireInput) -> Self {
        InputSnapshot {
            horizontal: raw.horizontal,
            vertical: raw.vertical,
            jump: raw.jump,
            crouch_edge: raw.crouch_edge,
            sprint: raw.sprint,
        }
        .clamped()
    }
}
