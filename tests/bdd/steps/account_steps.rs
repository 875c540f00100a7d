#![allow(deprecated)]
use cucumber::{given, then, when};

use super::common_steps::{assert_success, last_json, run_td};
use crate::TodosWorld;

/// Provision an account named `name` with email `<name>@example.com`.
fn add_user(world: &mut TodosWorld, name: &str, role: &str) {
    let email = format!("{}@example.com", name.to_lowercase());
    run_td(world, None, &["user", "add", name, &email, "--role", role]);
    assert_success(world);
    let id = last_json(world)["user"]["id"]
        .as_i64()
        .expect("user add JSON has no user.id");
    world.user_ids.insert(name.to_string(), id);
}

#[given(expr = "an admin named {string}")]
async fn an_admin_named(world: &mut TodosWorld, name: String) {
    add_user(world, &name, "admin");
}

#[given(expr = "a user named {string}")]
async fn a_user_named(world: &mut TodosWorld, name: String) {
    add_user(world, &name, "user");
}

#[when(expr = "{string} lists users")]
async fn lists_users(world: &mut TodosWorld, actor: String) {
    run_td(world, Some(&actor), &["user", "list"]);
}

#[when(expr = "{string} deletes the account of {string}")]
async fn deletes_account(world: &mut TodosWorld, actor: String, target: String) {
    let id = world.user_id(&target).to_string();
    run_td(world, Some(&actor), &["user", "delete", &id]);
}

#[when(expr = "{string} sets the role of {string} to {string}")]
async fn sets_role(world: &mut TodosWorld, actor: String, target: String, role: String) {
    let id = world.user_id(&target).to_string();
    run_td(world, Some(&actor), &["user", "role", &id, &role]);
}

#[when(expr = "{string} renames their profile to {string}")]
async fn renames_profile(world: &mut TodosWorld, actor: String, name: String) {
    run_td(world, Some(&actor), &["profile", "update", "--name", &name]);
}

#[then(expr = "{string} has the role {string}")]
async fn has_role(world: &mut TodosWorld, name: String, role: String) {
    // Read through the profile so no admin is needed.
    run_td(world, Some(&name), &["profile", "show"]);
    assert_success(world);
    let json = last_json(world);
    assert_eq!(json["user"]["role"], role.as_str(), "profile: {json}");
}

#[then(expr = "the user listing has {int} entries")]
async fn user_listing_has(world: &mut TodosWorld, n: usize) {
    assert_success(world);
    let json = last_json(world);
    let data = json["data"].as_array().expect("listing has no data array");
    assert_eq!(data.len(), n, "listing: {json}");
}

#[then(expr = "the profile name is {string}")]
async fn profile_name_is(world: &mut TodosWorld, name: String) {
    assert_success(world);
    let json = last_json(world);
    assert_eq!(json["user"]["name"], name.as_str(), "output: {json}");
}
