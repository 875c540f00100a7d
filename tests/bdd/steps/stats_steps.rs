#![allow(deprecated)]
use cucumber::{then, when};

use super::common_steps::{assert_success, last_json, run_td};
use crate::TodosWorld;

#[when(expr = "{string} views their statistics")]
async fn views_their_statistics(world: &mut TodosWorld, actor: String) {
    run_td(world, Some(&actor), &["stats"]);
}

#[when(expr = "{string} views the global statistics")]
async fn views_global_statistics(world: &mut TodosWorld, actor: String) {
    run_td(world, Some(&actor), &["stats", "--global"]);
}

#[then(expr = "the statistics count {int} total, {int} completed, {int} incomplete and {int} overdue")]
async fn statistics_count(
    world: &mut TodosWorld,
    total: i64,
    completed: i64,
    incomplete: i64,
    overdue: i64,
) {
    assert_success(world);
    let json = last_json(world);
    let stats = &json["statistics"];
    assert_eq!(stats["total_todos"].as_i64(), Some(total), "stats: {json}");
    assert_eq!(stats["completed_todos"].as_i64(), Some(completed), "stats: {json}");
    assert_eq!(stats["incomplete_todos"].as_i64(), Some(incomplete), "stats: {json}");
    assert_eq!(stats["overdue_todos"].as_i64(), Some(overdue), "stats: {json}");
}

#[then(expr = "the statistics count {int} users of whom {int} have todos")]
async fn statistics_users(world: &mut TodosWorld, users: i64, with_todos: i64) {
    assert_success(world);
    let json = last_json(world);
    assert_eq!(json["statistics"]["total_users"].as_i64(), Some(users));
    assert_eq!(json["statistics"]["users_with_todos"].as_i64(), Some(with_todos));
}

#[then(expr = "{string} is listed with {int} todos and {int} completed")]
async fn listed_with(world: &mut TodosWorld, name: String, todos: i64, completed: i64) {
    assert_success(world);
    let json = last_json(world);
    let row = json["todos_by_user"]
        .as_array()
        .expect("no todos_by_user array")
        .iter()
        .find(|r| r["name"] == name.as_str())
        .unwrap_or_else(|| panic!("{name} missing from todos_by_user: {json}"))
        .clone();
    assert_eq!(row["todos_count"].as_i64(), Some(todos));
    assert_eq!(row["completed_todos_count"].as_i64(), Some(completed));
}
