use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use serde::Serialize;
use washday_core::{CycleFilter, CycleType, WashCycle};

use super::{print_json, CmdResult, Session};

#[derive(Args)]
pub struct HistoryArgs {
    /// Only wash or only dry cycles
    #[arg(long = "type")]
    cycle_type: Option<CycleType>,
    /// Maximum number of cycles (default: history.recent_limit)
    #[arg(long)]
    limit: Option<usize>,
    /// Only cycles from the last N days
    #[arg(long)]
    days: Option<i64>,
    /// Group by local calendar day
    #[arg(long)]
    by_day: bool,
}

#[derive(Serialize)]
struct Day {
    date: NaiveDate,
    cycles: Vec<WashCycle>,
}

pub fn run(args: HistoryArgs) -> CmdResult {
    let session = Session::open()?;
    let ctx = &session.ctx;
    let now = ctx.now();

    let filter = CycleFilter {
        cycle_type: args.cycle_type,
        from: args.days.map(|d| now - Duration::days(d.max(0))),
        to: None,
    };
    let limit = args.limit.unwrap_or(session.config.history.recent_limit);

    if args.by_day {
        let days: Vec<Day> = ctx
            .history_by_day(&filter, &Local)
            .into_iter()
            .take(limit)
            .map(|(date, cycles)| Day { date, cycles })
            .collect();
        print_json(&days)?;
    } else {
        let cycles: Vec<WashCycle> = ctx.history(&filter).into_iter().take(limit).collect();
        print_json(&cycles)?;
    }

    session.report_gateway_error();
    Ok(())
}
