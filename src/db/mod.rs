use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params, params_from_iter};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{
    NewTodo, NewUser, OwnedTodo, Page, Role, StatusFilter, Todo, TodoChanges, TodoScope, User,
    UserChanges, UserSummary, UserTodoCount, overdue_cutoff,
};

const TODO_COLUMNS: &str = "t.id, t.title, t.description, t.user_id, t.due_date, t.completed_at, \
     t.created_at, t.updated_at, u.name, u.email";

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Database { conn })
    }

    /// Private in-memory database, already migrated.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Create the schema tables if they don't exist.
    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT NOT NULL,
                email         TEXT NOT NULL UNIQUE,
                password_hash TEXT,
                role          TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS todos (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                title        TEXT NOT NULL,
                description  TEXT,
                user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                due_date     TEXT,
                completed_at TEXT,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id);
            CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed_at);
            CREATE INDEX IF NOT EXISTS idx_todos_due ON todos(due_date);
            CREATE INDEX IF NOT EXISTS idx_todos_created ON todos(created_at);
            ",
        )?;
        Ok(())
    }

    /// Drop every table and recreate the schema.
    pub fn reset(&self) -> Result<()> {
        self.conn
            .execute_batch("DROP TABLE IF EXISTS todos; DROP TABLE IF EXISTS users;")?;
        self.migrate()
    }

    // -- Users --

    pub fn insert_user(&self, new: &NewUser, now: DateTime<Utc>) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![new.name, new.email, new.password_hash, new.role, now],
            )
            .map_err(email_conflict)?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            name: new.name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self, page: u32, per_page: u32) -> Result<Page<User>> {
        let total = self.count_users()?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![per_page, offset(page, per_page)], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(Page::new(users, page, per_page, total))
    }

    /// Apply the given changes; returns `false` if the user does not exist.
    pub fn update_user(&self, id: i64, changes: &UserChanges, now: DateTime<Utc>) -> Result<bool> {
        let mut sets = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(name) = &changes.name {
            param_values.push(Box::new(name.clone()));
            sets.push(format!("name = ?{}", param_values.len()));
        }
        if let Some(email) = &changes.email {
            param_values.push(Box::new(email.clone()));
            sets.push(format!("email = ?{}", param_values.len()));
        }
        if let Some(hash) = &changes.password_hash {
            param_values.push(Box::new(hash.clone()));
            sets.push(format!("password_hash = ?{}", param_values.len()));
        }
        if let Some(role) = changes.role {
            param_values.push(Box::new(role));
            sets.push(format!("role = ?{}", param_values.len()));
        }

        if sets.is_empty() {
            return Ok(self.get_user(id)?.is_some());
        }

        param_values.push(Box::new(now));
        sets.push(format!("updated_at = ?{}", param_values.len()));
        param_values.push(Box::new(id));
        let sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            sets.join(", "),
            param_values.len()
        );

        let rows_changed = self
            .conn
            .execute(&sql, params_from_iter(param_values.iter()))
            .map_err(email_conflict)?;
        Ok(rows_changed > 0)
    }

    /// Delete a user and, through the foreign key, all of their todos.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn count_users(&self) -> Result<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Users owning at least one todo.
    pub fn count_users_with_todos(&self) -> Result<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM users u
             WHERE EXISTS (SELECT 1 FROM todos t WHERE t.user_id = u.id)",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Total and completed todo counts for every user, including users with none.
    pub fn todo_counts_by_user(&self) -> Result<Vec<UserTodoCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.name, u.email, COUNT(t.id), COUNT(t.completed_at)
             FROM users u
             LEFT JOIN todos t ON t.user_id = u.id
             GROUP BY u.id, u.name, u.email
             ORDER BY u.id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(UserTodoCount {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                todos_count: row.get(3)?,
                completed_todos_count: row.get(4)?,
            })
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    // -- Todos --

    /// Insert a todo owned by `owner`. Ownership has already been resolved by the policy.
    pub fn insert_todo(&self, new: &NewTodo, owner: i64, now: DateTime<Utc>) -> Result<Todo> {
        self.conn.execute(
            "INSERT INTO todos (title, description, user_id, due_date, completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
            params![new.title, new.description, owner, new.due_date, now],
        )?;

        Ok(Todo {
            id: self.conn.last_insert_rowid(),
            title: new.title.clone(),
            description: new.description.clone(),
            user_id: owner,
            due_date: new.due_date,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_todo(&self, id: i64) -> Result<Option<OwnedTodo>> {
        let todo = self
            .conn
            .query_row(
                &format!(
                    "SELECT {TODO_COLUMNS} FROM todos t JOIN users u ON u.id = t.user_id
                     WHERE t.id = ?1"
                ),
                params![id],
                row_to_owned_todo,
            )
            .optional()?;
        Ok(todo)
    }

    /// One page of todos matching `scope`, newest first.
    pub fn list_todos(
        &self,
        scope: &TodoScope,
        now: DateTime<Utc>,
        page: u32,
        per_page: u32,
    ) -> Result<Page<OwnedTodo>> {
        let total = self.count_todos(scope, now)?;

        let (where_sql, mut param_values) = scope_clause(scope, now);
        param_values.push(Box::new(per_page));
        let limit_idx = param_values.len();
        param_values.push(Box::new(offset(page, per_page)));
        let offset_idx = param_values.len();

        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos t JOIN users u ON u.id = t.user_id{where_sql}
             ORDER BY t.created_at DESC, t.id DESC
             LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(param_values.iter()), row_to_owned_todo)?;

        let mut todos = Vec::new();
        for row in rows {
            todos.push(row?);
        }
        Ok(Page::new(todos, page, per_page, total))
    }

    /// Count todos matching `scope` with the same predicates as [`Database::list_todos`].
    pub fn count_todos(&self, scope: &TodoScope, now: DateTime<Utc>) -> Result<i64> {
        let (where_sql, param_values) = scope_clause(scope, now);
        let n = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM todos t{where_sql}"),
            params_from_iter(param_values.iter()),
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Apply field changes; `user_id` must already be policy-checked.
    pub fn update_todo(&self, id: i64, changes: &TodoChanges, now: DateTime<Utc>) -> Result<bool> {
        let mut sets = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(title) = &changes.title {
            param_values.push(Box::new(title.clone()));
            sets.push(format!("title = ?{}", param_values.len()));
        }
        if let Some(description) = &changes.description {
            param_values.push(Box::new(description.clone()));
            sets.push(format!("description = ?{}", param_values.len()));
        }
        if let Some(due_date) = changes.due_date {
            param_values.push(Box::new(due_date));
            sets.push(format!("due_date = ?{}", param_values.len()));
        }
        if let Some(user_id) = changes.user_id {
            param_values.push(Box::new(user_id));
            sets.push(format!("user_id = ?{}", param_values.len()));
        }

        if sets.is_empty() {
            return Ok(self.get_todo(id)?.is_some());
        }

        param_values.push(Box::new(now));
        sets.push(format!("updated_at = ?{}", param_values.len()));
        param_values.push(Box::new(id));
        let sql = format!(
            "UPDATE todos SET {} WHERE id = ?{}",
            sets.join(", "),
            param_values.len()
        );

        let rows_changed = self
            .conn
            .execute(&sql, params_from_iter(param_values.iter()))?;
        Ok(rows_changed > 0)
    }

    /// Persist the completion timestamp of an already-mutated todo.
    pub fn save_completion(&self, todo: &Todo) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE todos SET completed_at = ?1, updated_at = ?2 WHERE id = ?3",
            params![todo.completed_at, todo.updated_at, todo.id],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_todo(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Remove every todo, keeping users.
    pub fn clear_todos(&self) -> Result<()> {
        self.conn.execute("DELETE FROM todos", [])?;
        Ok(())
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// WHERE clause and bound values for a todo scope. Columns are qualified with `t.`.
fn scope_clause(scope: &TodoScope, now: DateTime<Utc>) -> (String, Vec<Box<dyn ToSql>>) {
    let mut sql = String::from(" WHERE 1=1");
    let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(owner) = scope.owner {
        param_values.push(Box::new(owner));
        sql.push_str(&format!(" AND t.user_id = ?{}", param_values.len()));
    }

    match scope.status {
        Some(StatusFilter::Completed) => sql.push_str(" AND t.completed_at IS NOT NULL"),
        Some(StatusFilter::Incomplete) => sql.push_str(" AND t.completed_at IS NULL"),
        Some(StatusFilter::Overdue) => {
            let cutoff: NaiveDate = overdue_cutoff(now);
            param_values.push(Box::new(cutoff));
            sql.push_str(&format!(
                " AND t.completed_at IS NULL AND t.due_date IS NOT NULL AND t.due_date < ?{}",
                param_values.len()
            ));
        }
        None => {}
    }

    (sql, param_values)
}

fn offset(page: u32, per_page: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(per_page)
}

/// Turn a unique-email violation into a validation failure.
fn email_conflict(e: rusqlite::Error) -> Error {
    let duplicate = matches!(
        &e,
        rusqlite::Error::SqliteFailure(err, Some(msg))
            if err.code == ErrorCode::ConstraintViolation && msg.contains("users.email")
    );
    if duplicate {
        Error::Validation("The email has already been taken.".to_string())
    } else {
        Error::Store(e)
    }
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_owned_todo(row: &rusqlite::Row) -> rusqlite::Result<OwnedTodo> {
    let user_id: i64 = row.get(3)?;
    Ok(OwnedTodo {
        todo: Todo {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            user_id,
            due_date: row.get(4)?,
            completed_at: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        },
        owner: UserSummary {
            id: user_id,
            name: row.get(8)?,
            email: row.get(9)?,
        },
    })
}
