use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CycleType, WashCycle};

/// Every timer state change produces an Event.
/// The CLI prints them; the tick driver forwards completions to listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        cycle_type: CycleType,
        duration_secs: u64,
        schedule_id: u64,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// A running timer survived a restart and keeps counting down.
    TimerResumed {
        cycle_type: CycleType,
        remaining_secs: u64,
        schedule_id: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        cycle_type: CycleType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        cycle: WashCycle,
        at: DateTime<Utc>,
    },
    TimerReset {
        cycle_type: CycleType,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn cycle_type(&self) -> CycleType {
        match self {
            Event::TimerStarted { cycle_type, .. }
            | Event::TimerResumed { cycle_type, .. }
            | Event::TimerStopped { cycle_type, .. }
            | Event::TimerReset { cycle_type, .. } => *cycle_type,
            Event::TimerCompleted { cycle, .. } => cycle.cycle_type(),
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. })
    }
}
