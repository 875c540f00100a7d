use colored::Colorize;

use super::{CmdResult, Context, print_json, print_outcome, print_user, print_users};
use todos::models::{NewUser, Role, UserChanges};

/// Provision an account. No actor is involved, which is how the first admin
/// gets created.
pub fn add(
    ctx: &Context,
    name: &str,
    email: &str,
    role: Role,
    password_hash: Option<String>,
) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let user = svc.register_user(NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash,
        role,
    })?;
    print_outcome("User created successfully", "user", &user, ctx.json, |u| {
        print_user(u, false)
    })
}

pub fn list(ctx: &Context, page: Option<u32>) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let users = svc.list_users(&actor, page)?;
    print_users(&users, ctx.json)
}

pub fn show(ctx: &Context, id: i64) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let user = svc.get_user(&actor, id)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "user": user }));
    }
    print_user(&user, false)
}

pub fn update(ctx: &Context, id: i64, changes: UserChanges) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let user = svc.update_user(&actor, id, changes)?;
    print_outcome("User updated successfully", "user", &user, ctx.json, |u| {
        print_user(u, false)
    })
}

pub fn set_role(ctx: &Context, id: i64, role: Role) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let user = svc.update_role(&actor, id, role)?;
    print_outcome("User role updated successfully", "user", &user, ctx.json, |u| {
        print_user(u, false)
    })
}

pub fn delete(ctx: &Context, id: i64) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    svc.delete_user(&actor, id)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "message": "User deleted successfully" }));
    }
    println!("{}", format!("User {id} deleted").green());
    Ok(())
}
