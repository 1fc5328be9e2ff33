//! Integration tests for the timer lifecycle through the context.
//!
//! Every test drives the engines by hand with a manual clock, so results do
//! not depend on wall time.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;
use washday_core::{
    ContextSettings, CycleLoad, CycleType, LaundryContext, ManualClock, MemoryStore,
    NoopNotifier, PhaseKind, TimerEngine, WashTemperature,
};

fn start_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-06-01T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn context() -> LaundryContext {
    LaundryContext::load(
        Arc::new(MemoryStore::new()),
        Arc::new(NoopNotifier),
        Arc::new(ManualClock::new(start_instant())),
        ContextSettings::default(),
    )
}

#[test]
fn test_one_hour_wash_records_exactly_one_cycle() {
    let ctx = context();
    ctx.start_timer(CycleType::Wash, 3600).unwrap();

    let mut completions = 0;
    for _ in 0..3600 {
        if ctx.tick(CycleType::Wash).is_some_and(|e| e.is_completion()) {
            completions += 1;
        }
    }
    assert_eq!(completions, 1);
    assert!(ctx.tick(CycleType::Wash).is_none());

    let snap = ctx.timer_snapshot(CycleType::Wash);
    assert_eq!(snap.phase, PhaseKind::Completed);
    assert_eq!(snap.remaining_seconds, 0);
    assert!(snap.can_reset());

    let cycles = ctx.recent_cycles(10);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].duration_secs(), 3600);
    assert_eq!(cycles[0].cycle_type(), CycleType::Wash);
}

#[test]
fn test_load_is_copied_onto_the_cycle() {
    let ctx = context();
    let item = uuid::Uuid::new_v4();
    let load = CycleLoad {
        item_ids: vec![item],
        notes: "whites".into(),
        ..CycleLoad::with_temperature(WashTemperature::Hot)
    };
    ctx.start_timer_with(CycleType::Wash, 2, load).unwrap();
    ctx.tick(CycleType::Wash);
    ctx.tick(CycleType::Wash);

    let cycle = &ctx.recent_cycles(1)[0];
    assert_eq!(cycle.temperature(), WashTemperature::Hot);
    assert_eq!(cycle.item_ids(), &[item]);
    assert_eq!(cycle.notes(), "whites");
}

#[test]
fn test_stop_and_reset_are_noops_when_not_applicable() {
    let ctx = context();
    assert!(ctx.stop_timer(CycleType::Dry).is_none());
    assert!(ctx.reset_timer(CycleType::Dry).is_none());
    assert_eq!(
        ctx.timer_snapshot(CycleType::Dry),
        TimerEngine::new(CycleType::Dry, 3600).snapshot()
    );
}

#[test]
fn test_reset_from_running_stops_first() {
    let ctx = context();
    ctx.start_timer(CycleType::Dry, 10).unwrap();
    assert!(ctx.reset_timer(CycleType::Dry).is_some());
    assert_eq!(ctx.timer_snapshot(CycleType::Dry).phase, PhaseKind::Idle);
    for _ in 0..20 {
        assert!(ctx.tick(CycleType::Dry).is_none());
    }
    assert!(ctx.recent_cycles(10).is_empty());
}

proptest! {
    #![proptest_config(Config::with_cases(64))]

    #[test]
    fn completes_after_exactly_d_ticks(d in 1_i64..600) {
        let ctx = context();
        ctx.start_timer(CycleType::Dry, d).unwrap();
        for _ in 1..d {
            prop_assert!(ctx.tick(CycleType::Dry).is_none());
        }
        let last = ctx.tick(CycleType::Dry);
        prop_assert!(last.is_some_and(|e| e.is_completion()));
        prop_assert!(ctx.tick(CycleType::Dry).is_none());

        let cycles = ctx.recent_cycles(10);
        prop_assert_eq!(cycles.len(), 1);
        prop_assert_eq!(cycles[0].duration_secs(), d as u64);
    }

    #[test]
    fn stop_before_completion_records_nothing(d in 2_i64..600, ticks in 0_i64..600) {
        let ticks = ticks % (d - 1);
        let ctx = context();
        ctx.start_timer(CycleType::Wash, d).unwrap();
        for _ in 0..ticks {
            ctx.tick(CycleType::Wash);
        }
        prop_assert!(ctx.stop_timer(CycleType::Wash).is_some());
        for _ in 0..d {
            ctx.tick(CycleType::Wash);
        }
        prop_assert!(ctx.recent_cycles(10).is_empty());
        let snap = ctx.timer_snapshot(CycleType::Wash);
        prop_assert_eq!(snap.remaining_seconds, (d - ticks) as u64);
        prop_assert!(snap.remaining_seconds <= snap.total_seconds);
    }

    #[test]
    fn last_start_wins(d1 in 1_i64..300, d2 in 1_i64..300) {
        let ctx = context();
        ctx.start_timer(CycleType::Wash, d1).unwrap();
        ctx.start_timer(CycleType::Wash, d2).unwrap();
        prop_assert_eq!(ctx.timer_snapshot(CycleType::Wash).total_seconds, d2 as u64);
        for _ in 0..(d1 + d2) {
            ctx.tick(CycleType::Wash);
        }
        let cycles = ctx.recent_cycles(10);
        prop_assert_eq!(cycles.len(), 1);
        prop_assert_eq!(cycles[0].duration_secs(), d2 as u64);
    }

    #[test]
    fn reset_restores_fresh_snapshot(d in 1_i64..120, complete in any::<bool>()) {
        let ctx = context();
        ctx.start_timer(CycleType::Dry, d).unwrap();
        if complete {
            for _ in 0..d {
                ctx.tick(CycleType::Dry);
            }
        } else {
            ctx.stop_timer(CycleType::Dry);
        }
        ctx.reset_timer(CycleType::Dry);
        prop_assert_eq!(
            ctx.timer_snapshot(CycleType::Dry),
            TimerEngine::new(CycleType::Dry, 3600).snapshot()
        );
    }

    #[test]
    fn non_positive_durations_are_rejected(d in -10_000_i64..=0) {
        let ctx = context();
        prop_assert!(ctx.start_timer(CycleType::Wash, d).is_err());
        prop_assert_eq!(ctx.timer_snapshot(CycleType::Wash).phase, PhaseKind::Idle);
    }
}

#[test]
fn test_cold_start_after_long_absence() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start_instant()));
    let load = |clock: &Arc<ManualClock>| {
        LaundryContext::load(
            store.clone(),
            Arc::new(NoopNotifier),
            clock.clone(),
            ContextSettings::default(),
        )
    };

    let ctx = load(&clock);
    ctx.start_timer(CycleType::Wash, 3600).unwrap();
    ctx.start_timer(CycleType::Dry, 7200).unwrap();
    drop(ctx);

    clock.advance(Duration::minutes(90));
    let ctx = load(&clock);
    let events = ctx.reconcile_timers();
    assert_eq!(events.len(), 2);
    assert!(events[0].is_completion());
    assert!(!events[1].is_completion());
    assert_eq!(ctx.timer_snapshot(CycleType::Dry).remaining_seconds, 1800);
    assert_eq!(ctx.recent_cycles(10).len(), 1);
}
