use chrono::Local;

use super::{print_json, CmdResult, Session};

pub fn run() -> CmdResult {
    let session = Session::open()?;
    let stats = session.ctx.statistics(&Local::now());
    print_json(&stats)?;
    session.report_gateway_error();
    Ok(())
}
