mod driver;
mod engine;

pub use driver::TickDriver;
pub use engine::{
    PhaseKind, TimerEngine, TimerPhase, TimerState, DEFAULT_DURATION_SECS, MAX_DURATION_SECS,
};
