use super::{CmdResult, Context};
use todos::db::Database;

pub fn run(ctx: &Context) -> CmdResult {
    if let Some(parent) = ctx.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(&ctx.db_path)?;
    db.migrate()?;

    println!("Initialized todo database at {}", ctx.db_path.display());
    Ok(())
}
