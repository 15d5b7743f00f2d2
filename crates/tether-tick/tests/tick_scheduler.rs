//! Integration tests for the simulation clock.
//!
//! Every async test runs on a paused Tokio clock so ticks fire as soon as
//! the runtime is idle and overruns can be staged with `time::advance`.

use std::time::Duration;

use tether_tick::{TickConfig, TickPolicy, TickScheduler};
use tokio::time::{self, Instant};

// =========================================================================
// Helpers
// =========================================================================

fn config_20hz() -> TickConfig {
    TickConfig {
        initial_jitter_us: 0,
        ..TickConfig::with_rate(20)
    }
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_60hz_skip() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.tick_rate_hz, 60);
    assert_eq!(cfg.policy, TickPolicy::Skip);
    assert_eq!(cfg.tick_duration(), Duration::from_secs_f64(1.0 / 60.0));
}

#[test]
fn test_validated_zero_rate_becomes_one() {
    let cfg = TickConfig::with_rate(0).validated();
    assert_eq!(cfg.tick_rate_hz, 1);
    assert_eq!(cfg.tick_duration(), Duration::from_secs(1));
}

#[test]
fn test_validated_clamps_rate_and_threshold() {
    let cfg = TickConfig {
        tick_rate_hz: 1_000,
        budget_warn_threshold: 3.0,
        ..TickConfig::default()
    }
    .validated();
    assert_eq!(cfg.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
    assert_eq!(cfg.budget_warn_threshold, 1.0);
}

#[test]
fn test_config_deserializes_catch_up_policy() {
    let cfg: TickConfig = serde_json::from_str(
        r#"{ "tick_rate_hz": 30, "policy": { "mode": "catch_up", "max_catchup": 4 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.tick_rate_hz, 30);
    assert_eq!(cfg.policy, TickPolicy::CatchUp { max_catchup: 4 });
    assert_eq!(cfg.initial_jitter_us, TickConfig::default().initial_jitter_us);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_with_fixed_dt() {
    let mut s = TickScheduler::new(config_20hz());

    for expected in 1..=3 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        assert_eq!(info.dt, Duration::from_millis(50));
        assert!((info.dt_secs() - 0.05).abs() < 1e-6);
        assert!(!info.overrun);
        assert_eq!(info.ticks_skipped, 0);
    }
    assert_eq!(s.tick_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_jitter_stays_within_bound() {
    let start = Instant::now();
    let mut s = TickScheduler::new(TickConfig {
        initial_jitter_us: 5_000,
        ..TickConfig::with_rate(20)
    });

    s.wait_for_tick().await;
    let waited = Instant::now() - start;
    assert!(waited >= Duration::from_millis(50));
    assert!(waited < Duration::from_millis(55));
}

// =========================================================================
// Overruns
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reports_skipped_ticks() {
    let mut s = TickScheduler::new(config_20hz());
    s.wait_for_tick().await;

    // Next tick was due 50ms from now; show up 120ms after that.
    time::advance(Duration::from_millis(170)).await;
    let info = s.wait_for_tick().await;

    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 2);
    assert_eq!(s.overruns(), 1);
    assert_eq!(s.ticks_skipped(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_catch_up_policy_fires_missed_ticks_immediately() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::CatchUp { max_catchup: 5 },
        ..config_20hz()
    });
    s.wait_for_tick().await;
    time::advance(Duration::from_millis(170)).await;

    let late = s.wait_for_tick().await;
    assert!(late.overrun);
    assert_eq!(late.ticks_skipped, 0);

    let before = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(Instant::now(), before, "catch-up tick should not sleep");
}

#[tokio::test(start_paused = true)]
async fn test_catch_up_policy_caps_backlog() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::CatchUp { max_catchup: 1 },
        ..config_20hz()
    });
    s.wait_for_tick().await;
    time::advance(Duration::from_millis(250)).await;

    let info = s.wait_for_tick().await;
    assert_eq!(info.ticks_skipped, 3);
}

// =========================================================================
// Pause / resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_paused_scheduler_never_fires() {
    let mut s = TickScheduler::new(config_20hz());
    s.pause();
    assert!(s.is_paused());

    let result = time::timeout(Duration::from_secs(2), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
    assert_eq!(s.tick_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_resume_does_not_burst_after_long_pause() {
    let mut s = TickScheduler::new(config_20hz());
    s.wait_for_tick().await;
    s.pause();
    time::advance(Duration::from_secs(10)).await;
    s.resume();

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 2);
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_idempotent() {
    let mut s = TickScheduler::new(config_20hz());
    s.pause();
    s.pause();
    assert!(s.is_paused());
    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_tick_is_noop() {
    let mut s = TickScheduler::new(config_20hz());
    s.record_tick_end();
    assert_eq!(s.tick_count(), 0);
}

// =========================================================================
// select! loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut s = TickScheduler::new(config_20hz());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);

    tokio::spawn(async move {
        time::sleep(Duration::from_millis(160)).await;
        let _ = tx.send("leave").await;
    });

    let mut fired = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "leave");
                break;
            }
            info = s.wait_for_tick() => {
                fired += 1;
                assert_eq!(info.tick, fired);
                s.record_tick_end();
            }
        }
    }
    assert_eq!(fired, 3);
}
