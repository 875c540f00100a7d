use colored::Colorize;

use super::{CmdResult, Context, print_json, print_outcome, print_todo, print_todos};
use todos::models::{NewTodo, TodoChanges, TodoQuery};

pub fn create(ctx: &Context, new: NewTodo) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let todo = svc.create_todo(&actor, new)?;
    print_outcome("Todo created successfully", "todo", &todo, ctx.json, |t| {
        print_todo(t, false)
    })
}

pub fn list(ctx: &Context, query: &TodoQuery) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let page = svc.list_todos(&actor, query)?;
    print_todos(&page, ctx.json)
}

pub fn show(ctx: &Context, id: i64) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let todo = svc.get_todo(&actor, id)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "todo": todo }));
    }
    print_todo(&todo, false)
}

pub fn update(ctx: &Context, id: i64, changes: TodoChanges) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let todo = svc.update_todo(&actor, id, changes)?;
    print_outcome("Todo updated successfully", "todo", &todo, ctx.json, |t| {
        print_todo(t, false)
    })
}

pub fn delete(ctx: &Context, id: i64) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    svc.delete_todo(&actor, id)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "message": "Todo deleted successfully" }));
    }
    println!("{}", format!("Todo {id} deleted").green());
    Ok(())
}

pub fn toggle(ctx: &Context, id: i64) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let toggled = svc.toggle_complete(&actor, id)?;
    print_outcome(toggled.message, "todo", &toggled.todo, ctx.json, |t| {
        print_todo(t, false)
    })
}
