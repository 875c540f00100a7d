use super::{CmdResult, Context};
use todos::web::{self, AppState};

pub fn run(ctx: &Context, host: &str, port: u16) -> CmdResult {
    let db = ctx.open()?;
    let state = AppState::new(db, ctx.clock.clone());
    let addr = format!("{host}:{port}");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(state, &addr))?;
    Ok(())
}
