//! Demo data: one admin, one regular user and a handful of todos around
//! "now", including one completed per user and one overdue.

use chrono::Duration;
use serde::Serialize;
use tracing::info;

use crate::clock::Clock;
use crate::db::Database;
use crate::error::Result;
use crate::models::{NewTodo, NewUser, Role, User};
use crate::service::Service;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "user@example.com";

/// Title, description, due offset in days, hours since completion.
type Template = (&'static str, &'static str, i64, Option<i64>);

const ADMIN_TODOS: [Template; 3] = [
    (
        "Review user reports",
        "Check all user reports and respond to feedback",
        3,
        None,
    ),
    (
        "Update system documentation",
        "Update API documentation with new endpoints",
        7,
        None,
    ),
    (
        "Database backup",
        "Perform weekly database backup",
        1,
        Some(1),
    ),
];

const USER_TODOS: [Template; 4] = [
    (
        "Complete project proposal",
        "Finish writing the project proposal for the new client",
        5,
        None,
    ),
    (
        "Team meeting preparation",
        "Prepare agenda and materials for tomorrow's team meeting",
        1,
        None,
    ),
    (
        "Read the API guidelines",
        "Study the API guidelines and apply them to the new endpoints",
        7,
        Some(48),
    ),
    (
        "Submit monthly report",
        "Submit the monthly progress report to supervisor",
        -2,
        None,
    ),
];

#[derive(Debug, Serialize)]
pub struct SeedReport {
    pub admin: User,
    pub user: User,
    pub todos_created: usize,
}

/// Ensure the two demo accounts exist, then replace every todo with the demo set.
pub fn seed(db: &Database, clock: &dyn Clock) -> Result<SeedReport> {
    let svc = Service::new(db, clock);
    let admin = ensure_user(db, &svc, "Admin User", ADMIN_EMAIL, Role::Admin)?;
    let user = ensure_user(db, &svc, "Regular User", USER_EMAIL, Role::User)?;

    db.clear_todos()?;

    let now = clock.now();
    let mut todos_created = 0;
    for (owner, templates) in [(admin.id, &ADMIN_TODOS[..]), (user.id, &USER_TODOS[..])] {
        for (title, description, due_in, completed_ago) in templates {
            let new = NewTodo {
                title: title.to_string(),
                description: Some(description.to_string()),
                due_date: Some((now + Duration::days(*due_in)).date_naive()),
                user_id: None,
            };
            let mut todo = db.insert_todo(&new, owner, now)?;
            if let Some(ago) = completed_ago {
                todo.mark_completed(now - Duration::hours(*ago));
                db.save_completion(&todo)?;
            }
            todos_created += 1;
        }
    }

    info!(todos_created, "demo data seeded");
    Ok(SeedReport {
        admin,
        user,
        todos_created,
    })
}

fn ensure_user(
    db: &Database,
    svc: &Service<'_>,
    name: &str,
    email: &str,
    role: Role,
) -> Result<User> {
    if let Some(existing) = db.find_user_by_email(email)? {
        return Ok(existing);
    }
    svc.register_user(NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: None,
        role,
    })
}
