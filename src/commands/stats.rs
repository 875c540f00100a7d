use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{CmdResult, Context, print_json};
use todos::models::TodoCounts;

#[derive(Tabled)]
struct UserCountRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "TODOS")]
    todos: i64,
    #[tabled(rename = "DONE")]
    done: i64,
}

pub fn run(ctx: &Context, global: bool) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;

    if !global {
        let stats = svc.personal_stats(&actor)?;
        if ctx.json {
            return print_json(&stats);
        }
        print_counts(&stats.statistics);
        return Ok(());
    }

    let stats = svc.global_stats(&actor)?;
    if ctx.json {
        return print_json(&stats);
    }
    print_counts(&stats.statistics.todos);
    println!("  {:<14} {}", "users", stats.statistics.total_users);
    println!("  {:<14} {}", "with todos", stats.statistics.users_with_todos);

    if !stats.todos_by_user.is_empty() {
        println!();
        println!("By User");
        let rows = stats.todos_by_user.iter().map(|u| UserCountRow {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            todos: u.todos_count,
            done: u.completed_todos_count,
        });
        let table = Table::new(rows).with(Style::sharp()).to_string();
        println!("{table}");
    }
    Ok(())
}

fn print_counts(counts: &TodoCounts) {
    println!("Todos");
    println!("{}", "-".repeat(24));
    println!("  {:<14} {}", "total", counts.total_todos);
    println!("  {:<14} {}", "completed", counts.completed_todos);
    println!("  {:<14} {}", "incomplete", counts.incomplete_todos);
    let overdue = counts.overdue_todos.to_string();
    if counts.overdue_todos > 0 {
        println!("  {:<14} {}", "overdue", overdue.red().bold());
    } else {
        println!("  {:<14} {}", "overdue", overdue);
    }
}
