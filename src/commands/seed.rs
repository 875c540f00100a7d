use super::{CmdResult, Context, print_json};

pub fn run(ctx: &Context, fresh: bool) -> CmdResult {
    if let Some(parent) = ctx.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = todos::db::Database::open(&ctx.db_path)?;
    if fresh {
        db.reset()?;
    } else {
        db.migrate()?;
    }

    let report = todos::seed::seed(&db, ctx.clock.as_ref())?;

    if ctx.json {
        return print_json(&report);
    }
    println!("Seeded {} todos", report.todos_created);
    println!("  admin: #{} {}", report.admin.id, report.admin.email);
    println!("  user:  #{} {}", report.user.id, report.user.email);
    Ok(())
}
