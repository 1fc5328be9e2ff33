//! Appliance countdown state machine.
//!
//! The engine has no thread of its own. Something calls `tick()` once per
//! second while it is running: the [`TickDriver`](super::TickDriver) in a
//! live process, or a test loop.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Completed | Stopped) -> Idle
//!            ^ start() while Running replaces the countdown
//! ```
//!
//! Every `start()` bumps the schedule id. Ticks delivered with an older id
//! belong to a torn-down schedule and are ignored.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;
use crate::model::{CycleLoad, CycleType, WashCycle};

/// Countdown used for the idle snapshot when nothing else is configured.
pub const DEFAULT_DURATION_SECS: u64 = 3600;

/// No appliance program runs longer than a week.
pub const MAX_DURATION_SECS: u64 = 7 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum TimerPhase {
    /// Never started, or explicitly reset.
    Idle,
    Running {
        remaining_secs: u64,
        total_secs: u64,
        started_at: DateTime<Utc>,
        #[serde(default)]
        load: CycleLoad,
    },
    /// Reached zero; the cycle has been recorded.
    Completed {
        total_secs: u64,
        started_at: DateTime<Utc>,
    },
    /// Cancelled by the user before reaching zero. Nothing recorded.
    Stopped {
        remaining_secs: u64,
        total_secs: u64,
        started_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Idle,
    Running,
    Completed,
    Stopped,
}

/// Flat, read-only view of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub cycle_type: CycleType,
    pub phase: PhaseKind,
    pub is_running: bool,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub start_instant: Option<DateTime<Utc>>,
}

impl TimerState {
    /// 0.0 .. 1.0 of the countdown elapsed.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.total_seconds - self.remaining_seconds) as f64 / self.total_seconds as f64
    }

    /// `H:MM:SS` from one hour up, `MM:SS` below.
    pub fn formatted_time(&self) -> String {
        let hours = self.remaining_seconds / 3600;
        let minutes = (self.remaining_seconds % 3600) / 60;
        let seconds = self.remaining_seconds % 60;
        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes:02}:{seconds:02}")
        }
    }

    /// A reset control only makes sense after a run finished or was stopped.
    pub fn can_reset(&self) -> bool {
        matches!(self.phase, PhaseKind::Completed | PhaseKind::Stopped)
    }
}

/// Countdown engine for one appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEngine {
    cycle_type: CycleType,
    default_secs: u64,
    phase: TimerPhase,
    #[serde(default)]
    schedule_id: u64,
}

impl TimerEngine {
    /// Idle engine whose snapshot advertises `default_secs` as its total.
    pub fn new(cycle_type: CycleType, default_secs: u64) -> Self {
        Self {
            cycle_type,
            default_secs: default_secs.max(1),
            phase: TimerPhase::Idle,
            schedule_id: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn cycle_type(&self) -> CycleType {
        self.cycle_type
    }

    pub fn phase(&self) -> &TimerPhase {
        &self.phase
    }

    pub fn schedule_id(&self) -> u64 {
        self.schedule_id
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, TimerPhase::Running { .. })
    }

    pub fn default_secs(&self) -> u64 {
        self.default_secs
    }

    /// Only affects what an idle snapshot reports.
    pub fn set_default_secs(&mut self, secs: u64) {
        self.default_secs = secs.max(1);
    }

    /// Instant the running countdown is expected to hit zero.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        match &self.phase {
            TimerPhase::Running {
                total_secs,
                started_at,
                ..
            } => Some(*started_at + secs(*total_secs)),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> TimerState {
        let (phase, remaining_seconds, total_seconds, start_instant) = match &self.phase {
            TimerPhase::Idle => (PhaseKind::Idle, 0, self.default_secs, None),
            TimerPhase::Running {
                remaining_secs,
                total_secs,
                started_at,
                ..
            } => (PhaseKind::Running, *remaining_secs, *total_secs, Some(*started_at)),
            TimerPhase::Completed {
                total_secs,
                started_at,
            } => (PhaseKind::Completed, 0, *total_secs, Some(*started_at)),
            TimerPhase::Stopped {
                remaining_secs,
                total_secs,
                started_at,
            } => (PhaseKind::Stopped, *remaining_secs, *total_secs, Some(*started_at)),
        };
        TimerState {
            cycle_type: self.cycle_type,
            phase,
            is_running: phase == PhaseKind::Running,
            remaining_seconds,
            total_seconds,
            start_instant,
        }
    }

    pub fn progress(&self) -> f64 {
        self.snapshot().progress()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a countdown of `duration_secs`, replacing any running one.
    ///
    /// The caller tears down the previous tick schedule and alert; stale
    /// ticks are already inert because the schedule id moves on here.
    pub fn start(
        &mut self,
        duration_secs: i64,
        load: CycleLoad,
        now: DateTime<Utc>,
    ) -> Result<Event, ValidationError> {
        let total_secs = u64::try_from(duration_secs)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(ValidationError::NonPositiveDuration {
                seconds: duration_secs,
            })?;
        if total_secs > MAX_DURATION_SECS {
            return Err(ValidationError::InvalidValue {
                field: "duration".into(),
                message: format!("{total_secs}s exceeds the {MAX_DURATION_SECS}s limit"),
            });
        }

        self.schedule_id = self.schedule_id.wrapping_add(1);
        self.phase = TimerPhase::Running {
            remaining_secs: total_secs,
            total_secs,
            started_at: now,
            load,
        };
        Ok(Event::TimerStarted {
            cycle_type: self.cycle_type,
            duration_secs: total_secs,
            schedule_id: self.schedule_id,
            ends_at: now + secs(total_secs),
            at: now,
        })
    }

    /// One-second step. Returns `Some(Event::TimerCompleted)` exactly once,
    /// on the tick that reaches zero; any tick outside `Running` is inert.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let TimerPhase::Running { remaining_secs, .. } = &mut self.phase else {
            return None;
        };
        *remaining_secs = remaining_secs.saturating_sub(1);
        if *remaining_secs == 0 {
            return self.complete(now);
        }
        None
    }

    /// Tick on behalf of the schedule armed with `schedule_id`.
    pub fn tick_scheduled(&mut self, schedule_id: u64, now: DateTime<Utc>) -> Option<Event> {
        if schedule_id != self.schedule_id {
            return None;
        }
        self.tick(now)
    }

    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let TimerPhase::Running {
            remaining_secs,
            total_secs,
            started_at,
            ..
        } = self.phase
        else {
            return None;
        };
        self.schedule_id = self.schedule_id.wrapping_add(1);
        self.phase = TimerPhase::Stopped {
            remaining_secs,
            total_secs,
            started_at,
        };
        Some(Event::TimerStopped {
            cycle_type: self.cycle_type,
            remaining_secs,
            at: now,
        })
    }

    /// Back to a blank slate. From `Running` this stops first; from `Idle`
    /// it is a no-op.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.phase == TimerPhase::Idle {
            return None;
        }
        self.stop(now);
        self.phase = TimerPhase::Idle;
        Some(Event::TimerReset {
            cycle_type: self.cycle_type,
            at: now,
        })
    }

    /// Recompute a running countdown from its start instant after the
    /// process was away. Completes immediately if the time has run out; the
    /// cycle is then dated at the expected end, not at `now`.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let TimerPhase::Running {
            remaining_secs,
            total_secs,
            started_at,
            ..
        } = &mut self.phase
        else {
            return None;
        };
        let elapsed = u64::try_from((now - *started_at).num_seconds()).unwrap_or(0);
        *remaining_secs = total_secs.saturating_sub(elapsed);
        if *remaining_secs == 0 {
            let ends_at = *started_at + secs(*total_secs);
            return self.complete(ends_at);
        }
        Some(Event::TimerResumed {
            cycle_type: self.cycle_type,
            remaining_secs: *remaining_secs,
            schedule_id: self.schedule_id,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, occurred_at: DateTime<Utc>) -> Option<Event> {
        let TimerPhase::Running {
            total_secs,
            started_at,
            load,
            ..
        } = std::mem::replace(&mut self.phase, TimerPhase::Idle)
        else {
            return None;
        };
        self.phase = TimerPhase::Completed {
            total_secs,
            started_at,
        };
        let cycle = WashCycle::completed(self.cycle_type, total_secs, occurred_at, load);
        Some(Event::TimerCompleted {
            cycle,
            at: occurred_at,
        })
    }
}

// Totals are bounded by MAX_DURATION_SECS.
fn secs(s: u64) -> Duration {
    Duration::seconds(s.min(MAX_DURATION_SECS) as i64)
}
