use super::{print_json, CmdResult, Session};

pub fn run() -> CmdResult {
    let session = Session::open()?;
    let alerts = session.db.pending_alerts(session.ctx.now())?;
    print_json(&alerts)
}
