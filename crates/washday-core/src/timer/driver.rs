//! Drives running engines once per second on the tokio runtime.
//!
//! [`TickDriver`] keeps at most one ticking task per cycle type. Arming a
//! new schedule aborts the previous task first, and every task carries the
//! schedule id it was armed with, so a task that has been aborted but not yet
//! dropped ticks into nothing.
//!
//! ```rust,ignore
//! let (driver, mut events) = TickDriver::new(ctx.clone());
//! driver.start(CycleType::Wash, 3600, CycleLoad::default())?;
//! while let Some(event) = events.recv().await { /* completion */ }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::context::LaundryContext;
use crate::error::ValidationError;
use crate::events::Event;
use crate::model::{CycleLoad, CycleType};

const TICK: Duration = Duration::from_secs(1);

pub struct TickDriver {
    ctx: Arc<LaundryContext>,
    tasks: Mutex<HashMap<CycleType, JoinHandle<()>>>,
    events: mpsc::UnboundedSender<Event>,
}

impl TickDriver {
    /// Driver plus the receiving end of its completion channel.
    pub fn new(ctx: Arc<LaundryContext>) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let driver = Self {
            ctx,
            tasks: Mutex::new(HashMap::new()),
            events,
        };
        (driver, rx)
    }

    pub fn context(&self) -> &Arc<LaundryContext> {
        &self.ctx
    }

    /// Start a countdown and arm its ticking task. Must be called from
    /// inside a tokio runtime.
    pub fn start(
        &self,
        cycle_type: CycleType,
        duration_secs: i64,
        load: CycleLoad,
    ) -> Result<Event, ValidationError> {
        let event = self.ctx.start_timer_with(cycle_type, duration_secs, load)?;
        if let Event::TimerStarted { schedule_id, .. } = event {
            self.arm(cycle_type, schedule_id);
        }
        Ok(event)
    }

    pub fn stop(&self, cycle_type: CycleType) -> Option<Event> {
        let event = self.ctx.stop_timer(cycle_type);
        self.disarm(cycle_type);
        event
    }

    pub fn reset(&self, cycle_type: CycleType) -> Option<Event> {
        let event = self.ctx.reset_timer(cycle_type);
        self.disarm(cycle_type);
        event
    }

    /// Arm tasks for engines that are still running, typically right after
    /// [`LaundryContext::reconcile_timers`]. Returns the types armed.
    pub fn resume_running(&self) -> Vec<CycleType> {
        self.resume(&CycleType::ALL)
    }

    /// Like [`resume_running`](Self::resume_running), limited to `cycle_types`.
    pub fn resume(&self, cycle_types: &[CycleType]) -> Vec<CycleType> {
        cycle_types
            .iter()
            .copied()
            .filter_map(|cycle_type| {
                let schedule_id = self.ctx.running_schedule(cycle_type)?;
                self.arm(cycle_type, schedule_id);
                Some(cycle_type)
            })
            .collect()
    }

    /// Whether a ticking task for `cycle_type` is alive.
    pub fn is_armed(&self, cycle_type: CycleType) -> bool {
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&cycle_type)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort every task. Engines keep their state.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for (cycle_type, handle) in tasks.drain() {
            handle.abort();
            debug!(cycle_type = %cycle_type, "tick task aborted on shutdown");
        }
    }

    fn arm(&self, cycle_type: CycleType, schedule_id: u64) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = tasks.remove(&cycle_type) {
            previous.abort();
        }
        let handle = tokio::spawn(run_schedule(
            self.ctx.clone(),
            cycle_type,
            schedule_id,
            self.events.clone(),
        ));
        tasks.insert(cycle_type, handle);
        info!(cycle_type = %cycle_type, schedule_id, "tick schedule armed");
    }

    fn disarm(&self, cycle_type: CycleType) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = tasks.remove(&cycle_type) {
            handle.abort();
            debug!(cycle_type = %cycle_type, "tick schedule disarmed");
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_schedule(
    ctx: Arc<LaundryContext>,
    cycle_type: CycleType,
    schedule_id: u64,
    events: mpsc::UnboundedSender<Event>,
) {
    let mut ticker = interval(TICK);
    // Each tick is one second of countdown, so catch up after a stall.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match ctx.tick_scheduled(cycle_type, schedule_id) {
            Some(event) => {
                let done = event.is_completion();
                if events.send(event).is_err() {
                    debug!(cycle_type = %cycle_type, "no completion listener");
                }
                if done {
                    break;
                }
            }
            None if ctx.running_schedule(cycle_type) != Some(schedule_id) => {
                debug!(cycle_type = %cycle_type, schedule_id, "schedule superseded");
                break;
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::context::ContextSettings;
    use crate::gateway::{MemoryStore, NoopNotifier};
    use crate::timer::PhaseKind;
    use chrono::Utc;

    fn context() -> Arc<LaundryContext> {
        Arc::new(LaundryContext::load(
            Arc::new(MemoryStore::new()),
            Arc::new(NoopNotifier),
            Arc::new(ManualClock::new(Utc::now())),
            ContextSettings::default(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_duration_seconds() {
        let ctx = context();
        let (driver, mut events) = TickDriver::new(ctx.clone());
        driver.start(CycleType::Wash, 3, CycleLoad::default()).unwrap();

        let event = events.recv().await.unwrap();
        assert!(event.is_completion());
        assert_eq!(ctx.recent_cycles(10).len(), 1);
        assert_eq!(ctx.timer_snapshot(CycleType::Wash).phase, PhaseKind::Completed);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!driver.is_armed(CycleType::Wash));
        assert_eq!(ctx.recent_cycles(10).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_leaves_one_schedule() {
        let ctx = context();
        let (driver, mut events) = TickDriver::new(ctx.clone());
        driver.start(CycleType::Dry, 2, CycleLoad::default()).unwrap();
        driver.start(CycleType::Dry, 4, CycleLoad::default()).unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(ctx.timer_snapshot(CycleType::Dry).remaining_seconds, 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let cycles = ctx.recent_cycles(10);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].duration_secs(), 4);
        assert!(events.recv().await.unwrap().is_completion());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_records_nothing() {
        let ctx = context();
        let (driver, _events) = TickDriver::new(ctx.clone());
        driver.start(CycleType::Wash, 3, CycleLoad::default()).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        driver.stop(CycleType::Wash).unwrap();
        assert!(!driver.is_armed(CycleType::Wash));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(ctx.recent_cycles(10).is_empty());
        let snap = ctx.timer_snapshot(CycleType::Wash);
        assert_eq!(snap.phase, PhaseKind::Stopped);
        assert_eq!(snap.remaining_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn wash_and_dry_tick_independently() {
        let ctx = context();
        let (driver, mut events) = TickDriver::new(ctx.clone());
        driver.start(CycleType::Wash, 2, CycleLoad::default()).unwrap();
        driver.start(CycleType::Dry, 3, CycleLoad::default()).unwrap();

        let first = events.recv().await.unwrap();
        let second = events.recv().await.unwrap();
        assert_eq!(first.cycle_type(), CycleType::Wash);
        assert_eq!(second.cycle_type(), CycleType::Dry);
        assert_eq!(ctx.recent_cycles(10).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_running_rearms_running_engines() {
        let ctx = context();
        ctx.start_timer(CycleType::Dry, 2).unwrap();
        let (driver, mut events) = TickDriver::new(ctx.clone());
        assert_eq!(driver.resume_running(), vec![CycleType::Dry]);
        assert!(events.recv().await.unwrap().is_completion());
    }

    #[tokio::test(start_paused = true)]
    async fn resume_arms_only_the_requested_types() {
        let ctx = context();
        ctx.start_timer(CycleType::Wash, 2).unwrap();
        ctx.start_timer(CycleType::Dry, 2).unwrap();
        let (driver, mut events) = TickDriver::new(ctx.clone());
        assert_eq!(driver.resume(&[CycleType::Wash]), vec![CycleType::Wash]);
        assert!(!driver.is_armed(CycleType::Dry));

        assert_eq!(events.recv().await.unwrap().cycle_type(), CycleType::Wash);
        tokio::time::sleep(Duration::from_secs(10)).await;
        let dry = ctx.timer_snapshot(CycleType::Dry);
        assert!(dry.is_running);
        assert_eq!(dry.remaining_seconds, 2);
        assert_eq!(ctx.recent_cycles(10).len(), 1);
    }
}
