use super::{CmdResult, Context, print_json, print_outcome, print_user};
use todos::models::UserChanges;

pub fn show(ctx: &Context) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let user = svc.profile(&actor)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "user": user }));
    }
    print_user(&user, false)
}

pub fn update(ctx: &Context, name: Option<String>, email: Option<String>) -> CmdResult {
    let db = ctx.open()?;
    let svc = ctx.service(&db);
    let actor = ctx.actor(&svc)?;
    let changes = UserChanges {
        name,
        email,
        ..UserChanges::default()
    };
    let user = svc.update_profile(&actor, changes)?;
    print_outcome("Profile updated successfully", "user", &user, ctx.json, |u| {
        print_user(u, false)
    })
}
