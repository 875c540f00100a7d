#![allow(deprecated)]
use cucumber::{given, then, when};
use serde_json::Value;

use super::common_steps::{assert_success, last_json, run_td};
use crate::TodosWorld;

/// Run `td todo create` as `actor` and remember the new id under `alias`.
fn create_todo(world: &mut TodosWorld, actor: &str, alias: &str, extra_args: &[&str]) {
    let mut args = vec!["todo", "create"];
    args.extend_from_slice(extra_args);
    run_td(world, Some(actor), &args);
    assert_success(world);
    let id = last_json(world)["todo"]["id"]
        .as_i64()
        .expect("create JSON has no todo.id");
    world.todo_ids.insert(alias.to_string(), id);
}

fn listing(world: &TodosWorld) -> Vec<Value> {
    assert_success(world);
    last_json(world)["data"]
        .as_array()
        .expect("listing has no data array")
        .clone()
}

// ---------------------------------------------------------------------------
// Given / When steps
// ---------------------------------------------------------------------------

#[given(expr = "{string} has a todo {string}")]
async fn has_a_todo(world: &mut TodosWorld, actor: String, title: String) {
    create_todo(world, &actor, &title, &[&title]);
}

#[when(expr = "{string} creates a todo {string}")]
async fn creates_a_todo(world: &mut TodosWorld, actor: String, title: String) {
    create_todo(world, &actor, &title, &[&title]);
}

#[given(expr = "{string} has a todo {string} due {string}")]
async fn has_a_todo_due(world: &mut TodosWorld, actor: String, title: String, due: String) {
    create_todo(world, &actor, &title, &[&title, "--due", &due]);
}

/// Unlike the Given form, the outcome is left for a Then step to check.
#[when(expr = "{string} creates a todo {string} due {string}")]
async fn creates_a_todo_due(world: &mut TodosWorld, actor: String, title: String, due: String) {
    run_td(world, Some(&actor), &["todo", "create", &title, "--due", &due]);
}

#[given(expr = "{string} has a completed todo {string}")]
async fn has_a_completed_todo(world: &mut TodosWorld, actor: String, title: String) {
    create_todo(world, &actor, &title, &[&title]);
    let id = world.todo_id(&title).to_string();
    run_td(world, Some(&actor), &["todo", "toggle", &id]);
    assert_success(world);
}

#[when(expr = "{string} creates a todo without a title")]
async fn creates_a_todo_without_title(world: &mut TodosWorld, actor: String) {
    run_td(world, Some(&actor), &["todo", "create", ""]);
}

#[when(expr = "{string} creates a todo {string} for user id {int}")]
async fn creates_a_todo_for_id(world: &mut TodosWorld, actor: String, title: String, user: i64) {
    let user = user.to_string();
    run_td(world, Some(&actor), &["todo", "create", &title, "--user", &user]);
    if world.last_exit_code == 0 {
        if let Some(id) = last_json(world)["todo"]["id"].as_i64() {
            world.todo_ids.insert(title, id);
        }
    }
}

#[when(expr = "{string} creates a todo {string} for {string}")]
async fn creates_a_todo_for(world: &mut TodosWorld, actor: String, title: String, owner: String) {
    let owner_id = world.user_id(&owner).to_string();
    create_todo(world, &actor, &title, &[&title, "--user", &owner_id]);
}

#[when(expr = "{string} toggles {string}")]
async fn toggles(world: &mut TodosWorld, actor: String, alias: String) {
    let id = world.todo_id(&alias).to_string();
    run_td(world, Some(&actor), &["todo", "toggle", &id]);
}

#[when(expr = "{string} deletes {string}")]
async fn deletes(world: &mut TodosWorld, actor: String, alias: String) {
    let id = world.todo_id(&alias).to_string();
    run_td(world, Some(&actor), &["todo", "delete", &id]);
}

#[when(expr = "{string} views {string}")]
async fn views(world: &mut TodosWorld, actor: String, alias: String) {
    let id = world.todo_id(&alias).to_string();
    run_td(world, Some(&actor), &["todo", "show", &id]);
}

#[when(expr = "{string} retitles {string} to {string}")]
async fn retitles(world: &mut TodosWorld, actor: String, alias: String, title: String) {
    let id = world.todo_id(&alias).to_string();
    run_td(world, Some(&actor), &["todo", "update", &id, "--title", &title]);
}

#[when(expr = "{string} lists todos")]
async fn lists_todos(world: &mut TodosWorld, actor: String) {
    run_td(world, Some(&actor), &["todo", "list"]);
}

#[when(expr = "{string} lists {string} todos")]
async fn lists_todos_with_status(world: &mut TodosWorld, actor: String, status: String) {
    run_td(world, Some(&actor), &["todo", "list", "--status", &status]);
}

#[when(expr = "{string} lists the todos of {string}")]
async fn lists_todos_of(world: &mut TodosWorld, actor: String, owner: String) {
    let owner_id = world.user_id(&owner).to_string();
    run_td(world, Some(&actor), &["todo", "list", "--user", &owner_id]);
}

#[when(expr = "{string} lists page {int} of todos")]
async fn lists_page(world: &mut TodosWorld, actor: String, page: u32) {
    let page = page.to_string();
    run_td(world, Some(&actor), &["todo", "list", "--page", &page]);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then(expr = "the listing shows {int} todos")]
async fn listing_shows(world: &mut TodosWorld, n: usize) {
    let data = listing(world);
    assert_eq!(data.len(), n, "listing: {data:?}");
}

#[then(expr = "the listing total is {int}")]
async fn listing_total(world: &mut TodosWorld, total: i64) {
    assert_success(world);
    let json = last_json(world);
    assert_eq!(json["total"].as_i64(), Some(total), "listing: {json}");
}

#[then(expr = "the listing titles are {string}")]
async fn listing_titles(world: &mut TodosWorld, titles: String) {
    let data = listing(world);
    let got: Vec<&str> = data.iter().filter_map(|t| t["title"].as_str()).collect();
    let want: Vec<&str> = titles.split(',').map(str::trim).collect();
    assert_eq!(got, want);
}

#[then(expr = "every listed todo belongs to {string}")]
async fn every_listed_todo_belongs_to(world: &mut TodosWorld, owner: String) {
    let owner_id = world.user_id(&owner);
    for todo in listing(world) {
        assert_eq!(todo["user"]["id"].as_i64(), Some(owner_id), "todo: {todo}");
    }
}

#[then(expr = "the todo belongs to {string}")]
async fn the_todo_belongs_to(world: &mut TodosWorld, owner: String) {
    assert_success(world);
    let owner_id = world.user_id(&owner);
    let json = last_json(world);
    assert_eq!(json["todo"]["user"]["id"].as_i64(), Some(owner_id), "todo: {json}");
}

#[then("the todo is completed")]
async fn the_todo_is_completed(world: &mut TodosWorld) {
    assert_success(world);
    let json = last_json(world);
    assert_eq!(json["todo"]["is_completed"], true, "todo: {json}");
    assert!(!json["todo"]["completed_at"].is_null());
}

#[then("the todo is not completed")]
async fn the_todo_is_not_completed(world: &mut TodosWorld) {
    assert_success(world);
    let json = last_json(world);
    assert_eq!(json["todo"]["is_completed"], false, "todo: {json}");
    assert!(json["todo"]["completed_at"].is_null());
}

#[then("the todo is overdue")]
async fn the_todo_is_overdue(world: &mut TodosWorld) {
    assert_success(world);
    let json = last_json(world);
    assert_eq!(json["todo"]["is_overdue"], true, "todo: {json}");
}

#[then("the todo is not overdue")]
async fn the_todo_is_not_overdue(world: &mut TodosWorld) {
    assert_success(world);
    let json = last_json(world);
    assert_eq!(json["todo"]["is_overdue"], false, "todo: {json}");
}

#[then(expr = "{string} still exists for {string}")]
async fn still_exists(world: &mut TodosWorld, alias: String, owner: String) {
    let id = world.todo_id(&alias).to_string();
    run_td(world, Some(&owner), &["todo", "show", &id]);
    assert_success(world);
}
