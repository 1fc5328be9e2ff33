use super::{CmdResult, Session};

pub fn run(yes: bool) -> CmdResult {
    if !yes {
        return Err("this deletes every item, supply and cycle; pass --yes to confirm".into());
    }
    let session = Session::open()?;
    session.ctx.reset_all_data();
    session.report_gateway_error();
    println!("all data reset");
    Ok(())
}
