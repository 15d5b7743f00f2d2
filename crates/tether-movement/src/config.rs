//! Tuning for the character controller.

use serde::Deserialize;
use tracing::warn;

/// Movement tuning. Every field is optional when deserializing.
///
/// Speeds are in units per second, times in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Walking speed, unaffected by gravity or jumping.
    pub base_speed: f32,
    /// Added to `base_speed` while sprinting.
    pub sprint_bonus: f32,
    /// Initial upward rate of a jump.
    pub jump_force: f32,
    /// How long a jump keeps pushing upward.
    pub jump_time: f32,
    pub gravity: f32,
    /// Controller speed above which the character counts as running.
    pub min_run_speed: f32,
    /// Crouching subtracts `crouch_speed_factor * base_speed`.
    pub crouch_speed_factor: f32,
    /// The jump rate eases from `jump_force` down to
    /// `jump_tail_factor * jump_force`.
    pub jump_tail_factor: f32,
    /// Ceiling probe length as a multiple of half the capsule height.
    pub head_clearance: f32,
    /// Fraction of the remaining turn applied per tick.
    pub turn_smoothing: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            sprint_bonus: 3.5,
            jump_force: 18.0,
            jump_time: 0.85,
            gravity: 9.8,
            min_run_speed: 0.9,
            crouch_speed_factor: 0.5,
            jump_tail_factor: 0.30,
            head_clearance: 1.1,
            turn_smoothing: 0.15,
        }
    }
}

impl MovementConfig {
    /// Replaces values the simulator can't work with, warning about each.
    ///
    /// - `jump_time` must be positive and finite.
    /// - Ratios (`crouch_speed_factor`, `jump_tail_factor`,
    ///   `turn_smoothing`) are clamped to `0.0..=1.0`.
    /// - Speeds, forces and `gravity` may not be negative.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if !(self.jump_time.is_finite() && self.jump_time > 0.0) {
            warn!(
                jump_time = self.jump_time,
                fallback = defaults.jump_time,
                "jump_time must be positive, using default"
            );
            self.jump_time = defaults.jump_time;
        }

        for (name, value, fallback) in [
            (
                "crouch_speed_factor",
                &mut self.crouch_speed_factor,
                defaults.crouch_speed_factor,
            ),
            (
                "jump_tail_factor",
                &mut self.jump_tail_factor,
                defaults.jump_tail_factor,
            ),
            ("turn_smoothing", &mut self.turn_smoothing, defaults.turn_smoothing),
        ] {
            if !(0.0..=1.0).contains(&*value) {
                let fixed = if value.is_nan() { fallback } else { (*value).clamp(0.0, 1.0) };
                warn!(field = name, value = *value, fixed, "ratio out of range, clamping");
                *value = fixed;
            }
        }

        for (name, value) in [
            ("base_speed", &mut self.base_speed),
            ("sprint_bonus", &mut self.sprint_bonus),
            ("jump_force", &mut self.jump_force),
            ("gravity", &mut self.gravity),
            ("min_run_speed", &mut self.min_run_speed),
            ("head_clearance", &mut self.head_clearance),
        ] {
            if !(*value >= 0.0) {
                warn!(field = name, value = *value, "negative value, using 0");
                *value = 0.0;
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_controller_tuning() {
        let cfg = MovementConfig::default();
        assert_eq!(cfg.base_speed, 5.0);
        assert_eq!(cfg.jump_force, 18.0);
        assert_eq!(cfg.jump_time, 0.85);
        assert_eq!(cfg.turn_smoothing, 0.15);
    }

    #[test]
    fn test_validated_fixes_jump_time_and_ratios() {
        let cfg = MovementConfig {
            jump_time: 0.0,
            turn_smoothing: 4.0,
            jump_tail_factor: f32::NAN,
            gravity: -1.0,
            ..MovementConfig::default()
        }
        .validated();
        assert_eq!(cfg.jump_time, 0.85);
        assert_eq!(cfg.turn_smoothing, 1.0);
        assert_eq!(cfg.jump_tail_factor, 0.30);
        assert_eq!(cfg.gravity, 0.0);
    }

    #[test]
    fn test_validated_keeps_good_config() {
        assert_eq!(MovementConfig::default().validated(), MovementConfig::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: MovementConfig = serde_json::from_str(r#"{ "base_speed": 7.5 }"#).unwrap();
        assert_eq!(cfg.base_speed, 7.5);
        assert_eq!(cfg.sprint_bonus, 3.5);
    }
}
