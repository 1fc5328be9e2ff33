use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;
use uuid::Uuid;
use washday_core::{
    find_program, programs, CycleLoad, CycleType, Event, Program, TickDriver, TimerState,
    WashTemperature,
};

use super::{print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a countdown, replacing one already running for that appliance
    Start {
        /// wash or dry
        cycle_type: CycleType,
        /// Duration in seconds
        #[arg(long, conflicts_with_all = ["minutes", "program"])]
        seconds: Option<i64>,
        /// Duration in minutes
        #[arg(long, conflicts_with = "program")]
        minutes: Option<i64>,
        /// Use a preset program's duration (see `timer programs`)
        #[arg(long)]
        program: Option<String>,
        /// cold, warm or hot
        #[arg(long)]
        temperature: Option<WashTemperature>,
        /// Item in this load (repeatable)
        #[arg(long = "item")]
        items: Vec<Uuid>,
        /// Supply used for this load (repeatable)
        #[arg(long = "supply")]
        supplies: Vec<Uuid>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Cancel a running countdown without recording it
    Stop { cycle_type: CycleType },
    /// Clear a finished or stopped countdown
    Reset { cycle_type: CycleType },
    /// Print timer state as JSON
    Status { cycle_type: Option<CycleType> },
    /// Tick running countdowns in this process until they finish
    Watch { cycle_type: Option<CycleType> },
    /// List preset programs
    Programs { cycle_type: Option<CycleType> },
}

#[derive(Serialize)]
struct StatusView {
    #[serde(flatten)]
    state: TimerState,
    formatted_time: String,
    progress: f64,
    can_reset: bool,
}

impl From<TimerState> for StatusView {
    fn from(state: TimerState) -> Self {
        Self {
            formatted_time: state.formatted_time(),
            progress: state.progress(),
            can_reset: state.can_reset(),
            state,
        }
    }
}

fn selected(cycle_type: Option<CycleType>) -> Vec<CycleType> {
    cycle_type.map_or_else(|| CycleType::ALL.to_vec(), |t| vec![t])
}

fn resolve_duration(
    session: &Session,
    cycle_type: CycleType,
    seconds: Option<i64>,
    minutes: Option<i64>,
    program: Option<&Program>,
) -> Result<i64, Box<dyn std::error::Error>> {
    if let Some(seconds) = seconds {
        return Ok(seconds);
    }
    if let Some(minutes) = minutes {
        return minutes
            .checked_mul(60)
            .ok_or_else(|| format!("{minutes} minutes is out of range").into());
    }
    if let Some(program) = program {
        return Ok(program.duration_secs as i64);
    }
    Ok(session.config.default_secs(cycle_type) as i64)
}

pub fn run(action: TimerAction) -> CmdResult {
    let session = Session::open()?;
    let ctx = &session.ctx;

    match action {
        TimerAction::Start {
            cycle_type,
            seconds,
            minutes,
            program,
            temperature,
            items,
            supplies,
            notes,
        } => {
            let program = match program.as_deref() {
                Some(name) => Some(
                    find_program(cycle_type, name)
                        .ok_or_else(|| format!("no {cycle_type} program named '{name}'"))?,
                ),
                None => None,
            };
            let duration = resolve_duration(&session, cycle_type, seconds, minutes, program.as_ref())?;
            let load = CycleLoad {
                temperature: temperature
                    .or_else(|| program.and_then(|p| p.temperature))
                    .unwrap_or_default(),
                item_ids: items,
                supply_ids: supplies,
                notes: notes.unwrap_or_default(),
            };
            let event = ctx.start_timer_with(cycle_type, duration, load)?;
            print_json(&event)?;
        }
        TimerAction::Stop { cycle_type } => match ctx.stop_timer(cycle_type) {
            Some(event) => print_json(&event)?,
            None => print_json(&StatusView::from(ctx.timer_snapshot(cycle_type)))?,
        },
        TimerAction::Reset { cycle_type } => match ctx.reset_timer(cycle_type) {
            Some(event) => print_json(&event)?,
            None => print_json(&StatusView::from(ctx.timer_snapshot(cycle_type)))?,
        },
        TimerAction::Status { cycle_type } => {
            let views: Vec<StatusView> = selected(cycle_type)
                .into_iter()
                .map(|t| StatusView::from(ctx.timer_snapshot(t)))
                .collect();
            match cycle_type {
                Some(_) => print_json(&views[0])?,
                None => print_json(&views)?,
            }
        }
        TimerAction::Watch { cycle_type } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(&session, selected(cycle_type)))?;
        }
        TimerAction::Programs { cycle_type } => {
            let list: Vec<Program> = selected(cycle_type)
                .into_iter()
                .flat_map(|t| programs(t).iter().copied())
                .collect();
            print_json(&list)?;
        }
    }

    session.report_gateway_error();
    Ok(())
}

async fn watch(session: &Session, watched: Vec<CycleType>) -> CmdResult {
    let ctx = &session.ctx;
    let (driver, mut events) = TickDriver::new(ctx.clone());
    let armed = driver.resume(&watched);
    if armed.is_empty() {
        eprintln!("no running timer to watch");
        return Ok(());
    }

    let mut status = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let Event::TimerCompleted { .. } = &event {
                    eprintln!();
                    print_json(&event)?;
                }
                if armed.iter().all(|t| ctx.running_schedule(*t).is_none()) {
                    break;
                }
            }
            _ = status.tick() => {
                // Another invocation may have stopped or restarted the run.
                for t in &armed {
                    if ctx.refresh_timer(*t) {
                        eprintln!("\n{t} timer changed by another washday process");
                        // A restart elsewhere is a new run; follow it.
                        driver.resume(&[*t]);
                    }
                }
                if armed.iter().all(|t| ctx.running_schedule(*t).is_none()) {
                    break;
                }
                let line: Vec<String> = armed
                    .iter()
                    .map(|t| format!("{t} {}", ctx.timer_snapshot(*t).formatted_time()))
                    .collect();
                eprint!("\r{}", line.join("  "));
            }
            _ = &mut ctrl_c => {
                eprintln!("\ndetached; the countdown continues and is reconciled on the next run");
                break;
            }
        }
    }

    driver.shutdown();
    Ok(())
}
