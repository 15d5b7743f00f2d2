//! Fixed-timestep simulation clock for Tether.
//!
//! The client simulates movement at a fixed rate (60 Hz by default) so
//! every process integrating the same input arrives at the same state.
//! [`TickScheduler`] hands out those ticks; game code never looks at
//! wall-clock deltas.
//!
//! # Integration
//!
//! The scheduler sits inside the client's `tokio::select!` loop next to the
//! transport event channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = events.recv() => { /* dispatch */ }
//!         info = scheduler.wait_for_tick() => {
//!             world.tick(info.dt_secs());
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! While no room is active the client pauses the scheduler, which makes
//! [`TickScheduler::wait_for_tick`] pend so the select loop only serves
//! events.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::Deserialize;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the simulation falls behind its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Fire missed ticks back to back, at most `max_catchup` of them.
    CatchUp { max_catchup: u32 },
}

/// Configuration for the simulation clock.
///
/// Deserializes with every field optional:
///
/// ```
/// let cfg: tether_tick::TickConfig =
///     serde_json::from_str(r#"{ "tick_rate_hz": 30 }"#).unwrap();
/// assert_eq!(cfg.tick_rate_hz, 30);
/// assert_eq!(cfg.policy, tether_tick::TickPolicy::Skip);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Simulation rate in Hz. Clamped to `1..=MAX_TICK_RATE_HZ`.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the tick budget (0.0–1.0) above which a tick's own
    /// work is reported with a warning.
    pub budget_warn_threshold: f64,
    /// Random delay (0–max µs) before the first tick.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            initial_jitter_us: 1_000,
        }
    }
}

impl TickConfig {
    /// Highest rate the scheduler accepts.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// Default config at a specific rate.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values, warning about each one.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz == 0 {
            warn!("tick_rate_hz is 0, using 1");
            self.tick_rate_hz = 1;
        } else if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        if !(0.0..=1.0).contains(&self.budget_warn_threshold) {
            warn!(
                threshold = self.budget_warn_threshold,
                "budget_warn_threshold out of range, clamping"
            );
            self.budget_warn_threshold = if self.budget_warn_threshold.is_nan() {
                0.80
            } else {
                self.budget_warn_threshold.clamp(0.0, 1.0)
            };
        }
        self
    }

    /// Length of one tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// TickInfo
// ---------------------------------------------------------------------------

/// One fired tick, as returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Fixed step. Always `1 / tick_rate_hz`.
    pub dt: Duration,
    /// The tick woke up more than 10% of a step late.
    pub overrun: bool,
    /// Ticks dropped to get back on schedule.
    pub ticks_skipped: u64,
}

impl TickInfo {
    /// The step in seconds, as the movement code consumes it.
    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep scheduler driving one client's simulation.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    next_tick: TokioInstant,
    /// Set when a tick fires, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    paused: bool,
    overruns: u64,
    skipped: u64,
}

impl TickScheduler {
    /// Creates a running scheduler. The first tick is due one step (plus
    /// jitter) from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };

        debug!(
            rate_hz = config.tick_rate_hz,
            step_ms = tick_duration.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            next_tick: TokioInstant::now() + tick_duration + jitter,
            config,
            tick_duration,
            tick_count: 0,
            tick_start: None,
            paused: false,
            overruns: 0,
            skipped: 0,
        }
    }

    /// Scheduler at a specific rate with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next tick.
    ///
    /// Pends forever while paused; `tokio::select!` keeps serving its
    /// other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            return std::future::pending().await;
        }

        let due = self.next_tick;
        let step = self.tick_duration;
        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > step / 10;
        let behind = (late_by.as_nanos() / step.as_nanos().max(1)) as u64;
        let mut ticks_skipped = 0;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun && behind > 0 {
                    ticks_skipped = behind;
                    warn!(
                        tick = self.tick_count,
                        skipped = behind,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "simulation behind, skipping ahead"
                    );
                }
                now + step
            }
            TickPolicy::CatchUp { max_catchup } => {
                if behind <= u64::from(max_catchup) {
                    due + step
                } else {
                    ticks_skipped = behind - u64::from(max_catchup);
                    warn!(
                        tick = self.tick_count,
                        behind,
                        skipped = ticks_skipped,
                        "simulation too far behind, catch-up capped at {max_catchup}"
                    );
                    now + step
                }
            }
        };

        if overrun {
            self.overruns += 1;
        }
        self.skipped += ticks_skipped;
        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: step,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the current tick's work and checks it against the
    /// budget. A no-op if no tick is in progress.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick work approaching step budget"
            );
        }
    }

    /// Stops ticking. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.tick_start = None;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Starts ticking again, one step from now. Time spent paused is not
    /// caught up.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = TokioInstant::now() + self.tick_duration;
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Ticks that woke up late.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Ticks dropped by the overrun policy.
    pub fn ticks_skipped(&self) -> u64 {
        self.skipped
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}
