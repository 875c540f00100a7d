pub mod init;
pub mod profile;
pub mod seed;
pub mod serve;
pub mod stats;
pub mod todo;
pub mod user;

use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use thiserror::Error;

use todos::clock::Clock;
use todos::db::Database;
use todos::models::{Actor, Page, TodoResource, User};
use todos::service::Service;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] todos::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Usage(String),
}

pub type CmdResult = Result<(), CliError>;

/// Settings shared by every subcommand.
pub struct Context {
    pub db_path: PathBuf,
    pub actor: Option<i64>,
    pub clock: Arc<dyn Clock>,
    pub json: bool,
}

impl Context {
    /// Open an initialized database.
    pub fn open(&self) -> Result<Database, CliError> {
        if !self.db_path.exists() {
            return Err(CliError::Usage(format!(
                "no database at {}; run `td init` first",
                self.db_path.display()
            )));
        }
        let db = Database::open(&self.db_path)?;
        db.migrate()?;
        Ok(db)
    }

    pub fn service<'a>(&'a self, db: &'a Database) -> Service<'a> {
        Service::new(db, self.clock.as_ref())
    }

    /// The acting user named by `--as`, with its current role.
    pub fn actor(&self, svc: &Service<'_>) -> Result<Actor, CliError> {
        let id = self
            .actor
            .ok_or_else(|| CliError::Usage("this command needs --as <USER_ID>".to_string()))?;
        Ok(svc.resolve_actor(id)?)
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a todo's state as a colored label.
pub fn format_state(todo: &TodoResource) -> String {
    if todo.is_completed {
        "done".bright_black().to_string()
    } else if todo.is_overdue {
        "overdue".red().bold().to_string()
    } else {
        "open".green().to_string()
    }
}

pub fn format_role(user: &User) -> String {
    if user.is_admin() {
        user.role.as_str().yellow().bold().to_string()
    } else {
        user.role.as_str().to_string()
    }
}

#[derive(Tabled)]
struct TodoRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "OWNER")]
    owner: String,
    #[tabled(rename = "TITLE")]
    title: String,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "ROLE")]
    role: String,
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

/// Print a page of todos as a table or JSON.
pub fn print_todos(page: &Page<TodoResource>, json: bool) -> CmdResult {
    if json {
        return print_json(page);
    }
    if page.data.is_empty() {
        println!("No todos found.");
        return Ok(());
    }
    let rows = page.data.iter().map(|t| TodoRow {
        id: t.id,
        state: format_state(t),
        due: t.due_date.map(|d| d.to_string()).unwrap_or_default(),
        owner: t.user.name.clone(),
        title: truncate(&t.title, 48),
    });
    let table = Table::new(rows).with(Style::sharp()).to_string();
    println!("{table}");
    print_page_footer(page);
    Ok(())
}

/// Print a page of users as a table or JSON.
pub fn print_users(page: &Page<User>, json: bool) -> CmdResult {
    if json {
        return print_json(page);
    }
    if page.data.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    let rows = page.data.iter().map(|u| UserRow {
        id: u.id,
        name: u.name.clone(),
        email: u.email.clone(),
        role: format_role(u),
    });
    let table = Table::new(rows).with(Style::sharp()).to_string();
    println!("{table}");
    print_page_footer(page);
    Ok(())
}

fn print_page_footer<T>(page: &Page<T>) {
    println!(
        "{}",
        format!(
            "page {} of {} ({} total)",
            page.current_page, page.last_page, page.total
        )
        .bright_black()
    );
}

/// Print one todo in detail.
pub fn print_todo(todo: &TodoResource, json: bool) -> CmdResult {
    if json {
        return print_json(todo);
    }
    println!("{} {}", format!("#{}", todo.id).bold(), todo.title.bold());
    println!("  state:    {}", format_state(todo));
    println!("  owner:    {} <{}>", todo.user.name, todo.user.email);
    if let Some(due) = todo.due_date {
        println!("  due:      {due}");
    }
    if let Some(done) = todo.completed_at {
        println!("  done at:  {}", done.format("%F %T"));
    }
    println!("  created:  {}", todo.created_at.format("%F %T"));
    println!("  updated:  {}", todo.updated_at.format("%F %T"));
    if let Some(desc) = &todo.description {
        println!();
        println!("{desc}");
    }
    Ok(())
}

/// Print one user in detail.
pub fn print_user(user: &User, json: bool) -> CmdResult {
    if json {
        return print_json(user);
    }
    println!("{} {}", format!("#{}", user.id).bold(), user.name.bold());
    println!("  email:    {}", user.email);
    println!("  role:     {}", format_role(user));
    println!("  created:  {}", user.created_at.format("%F %T"));
    Ok(())
}

/// Print a mutation result: `{"message", key: value}` as JSON, or the message
/// followed by the detail view.
pub fn print_outcome<T: Serialize>(
    message: &str,
    key: &str,
    value: &T,
    json: bool,
    detail: impl FnOnce(&T) -> CmdResult,
) -> CmdResult {
    if json {
        let mut out = serde_json::Map::new();
        out.insert("message".to_string(), message.into());
        out.insert(key.to_string(), serde_json::to_value(value)?);
        return print_json(&out);
    }
    println!("{}", message.green());
    detail(value)
}
