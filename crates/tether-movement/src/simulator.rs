//! The per-tick movement integrator.
//!
//! [`MovementSimulator::advance`] is a pure function of the previous state,
//! this tick's input (if any arrived) and a [`TickContext`]. Every process
//! simulating an entity runs it with the same arguments and gets the same
//! displacement; only the state-authority holder's result is published.
//!
//! Order of work inside one tick:
//!
//! 1. On input ticks, latch the axes and buttons and apply the crouch edge.
//!    On ticks without input the previous values are held.
//! 2. Refresh sprinting from the grounded state and controller speed.
//! 3. On input ticks, start a jump if grounded and jump is held.
//! 4. Cancel the jump if the ceiling probe hit.
//! 5. Integrate horizontal, jump and gravity displacement.
//! 6. Turn toward the movement direction.

use glam::{Quat, Vec3};
use tether_protocol::InputSnapshot;
use tracing::trace;

use crate::{
    AnimationFlags, CameraBasis, CeilingProbe, CharacterBody, KinematicState, MovementConfig,
    MovementStep, TickContext,
};

/// Hermite ease between `from` and `to`; `t` is clamped to `0.0..=1.0`.
///
/// ```
/// use tether_movement::smoothstep;
/// assert_eq!(smoothstep(18.0, 5.4, 0.0), 18.0);
/// assert!((smoothstep(18.0, 5.4, 1.0) - 5.4).abs() < 1e-6);
/// ```
pub fn smoothstep(from: f32, to: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let t = -2.0 * t * t * t + 3.0 * t * t;
    to * t + from * (1.0 - t)
}

/// Turns input into character motion.
#[derive(Debug, Clone, Default)]
pub struct MovementSimulator {
    config: MovementConfig,
}

impl MovementSimulator {
    /// Creates a simulator, validating the tuning first.
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Computes one tick.
    ///
    /// `input == None` means nothing arrived this tick: axes and held
    /// buttons keep their last values, and neither the crouch edge nor a
    /// new jump is evaluated.
    pub fn advance(
        &self,
        state: &KinematicState,
        input: Option<&InputSnapshot>,
        ctx: &TickContext,
    ) -> MovementStep {
        let cfg = &self.config;
        let mut next = *state;
        let dt = ctx.dt.max(0.0);

        if let Some(input) = input.map(|i| i.clamped()) {
            next.horizontal_input = input.horizontal;
            next.vertical_input = input.vertical;
            next.jump_requested = input.jump;
            next.sprint_requested = input.sprint;
            if input.crouch_edge && !state.crouch_toggled {
                next.is_crouching = !next.is_crouching;
            }
            next.crouch_toggled = input.crouch_edge;
        }

        let moving_fast = ctx.speed > cfg.min_run_speed;
        if ctx.grounded {
            next.is_sprinting = moving_fast && next.sprint_requested;
        }
        let animation = AnimationFlags {
            crouch: next.is_crouching,
            run: ctx.grounded && moving_fast,
            sprint: next.is_sprinting,
            air: !ctx.grounded,
        };

        if input.is_some() && next.jump_requested && ctx.grounded && !next.is_jumping {
            next.is_jumping = true;
            next.jump_elapsed_time = 0.0;
        }

        if ctx.ceiling_blocked && next.is_jumping {
            trace!("ceiling hit, jump cancelled");
            next.is_jumping = false;
            next.jump_elapsed_time = 0.0;
        }

        // Crouching wins over sprinting.
        let speed_modifier = if next.is_crouching {
            -cfg.crouch_speed_factor * cfg.base_speed
        } else if next.is_sprinting {
            cfg.sprint_bonus
        } else {
            0.0
        };
        let speed = cfg.base_speed + speed_modifier;
        let dir_x = next.horizontal_input * speed * dt;
        let dir_z = next.vertical_input * speed * dt;

        let mut dir_y = 0.0;
        if next.is_jumping {
            let t = next.jump_elapsed_time / cfg.jump_time;
            dir_y = smoothstep(cfg.jump_force, cfg.jump_force * cfg.jump_tail_factor, t) * dt;
            next.jump_elapsed_time += dt;
            if next.jump_elapsed_time >= cfg.jump_time {
                next.is_jumping = false;
                next.jump_elapsed_time = 0.0;
            }
        }
        dir_y -= cfg.gravity * dt;
        next.vertical_velocity_accumulator = dir_y;

        let camera = ctx.camera.flattened();
        let horizontal = camera.forward * dir_z + camera.right * dir_x;

        let mut rotation = ctx.rotation;
        if dir_x != 0.0 || dir_z != 0.0 {
            let target = Quat::from_rotation_y(horizontal.x.atan2(horizontal.z));
            rotation = ctx.rotation.slerp(target, cfg.turn_smoothing).normalize();
        }

        MovementStep {
            state: next,
            displacement: horizontal + Vec3::Y * dir_y,
            rotation,
            animation,
        }
    }

    /// Runs one tick against a character controller: queries the body and
    /// ceiling probe, advances, then turns and moves the body.
    pub fn step(
        &self,
        state: &KinematicState,
        input: Option<&InputSnapshot>,
        body: &mut dyn CharacterBody,
        probe: &dyn CeilingProbe,
        camera: CameraBasis,
        dt: f32,
    ) -> MovementStep {
        let reach = body.height() / 2.0 * self.config.head_clearance;
        let ctx = TickContext {
            dt,
            grounded: body.is_grounded(),
            speed: body.speed(),
            ceiling_blocked: probe.hits_ceiling(body.capsule_center(), reach),
            camera,
            rotation: body.rotation(),
        };

        let step = self.advance(state, input, &ctx);
        body.set_rotation(step.rotation);
        body.move_by(step.displacement, dt);
        step
    }
}
