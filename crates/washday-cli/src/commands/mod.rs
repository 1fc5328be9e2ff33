pub mod alerts;
pub mod completions;
pub mod config;
pub mod history;
pub mod item;
pub mod reset;
pub mod stats;
pub mod supply;
pub mod timer;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use washday_core::{
    Config, ContextSettings, CoreError, Database, Event, LaundryContext, SystemClock,
};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: the context over the on-disk database, the
/// database itself for alert listings, and the loaded config.
pub struct Session {
    pub ctx: Arc<LaundryContext>,
    pub db: Arc<Database>,
    pub config: Config,
}

impl Session {
    /// Open the data directory and catch timers up with the wall clock.
    pub fn open() -> Result<Self, CoreError> {
        let config = Config::load()?;
        let db = Arc::new(Database::open()?);
        debug!(path = ?db.path(), "database opened");
        let ctx = Arc::new(LaundryContext::load(
            db.clone(),
            db.clone(),
            Arc::new(SystemClock),
            ContextSettings::from(&config),
        ));

        for event in ctx.reconcile_timers() {
            if let Event::TimerCompleted { cycle, .. } = &event {
                eprintln!(
                    "{} cycle finished at {}",
                    cycle.cycle_type(),
                    cycle.occurred_at().format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }

        Ok(Self { ctx, db, config })
    }

    /// Surface a persistence or alert failure the last command ran into.
    pub fn report_gateway_error(&self) {
        if let Some(e) = self.ctx.take_gateway_error() {
            eprintln!("warning: {e}");
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
