use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Todos per page in every listing.
pub const PER_PAGE: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s}. valid roles: user, admin")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status filter accepted by todo listings and counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Completed,
    Incomplete,
    Overdue,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Completed => "completed",
            StatusFilter::Incomplete => "incomplete",
            StatusFilter::Overdue => "overdue",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(StatusFilter::Completed),
            "incomplete" => Ok(StatusFilter::Incomplete),
            "overdue" => Ok(StatusFilter::Overdue),
            _ => Err(format!(
                "unknown status: {s}. valid statuses: completed, incomplete, overdue"
            )),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Owner fields embedded in rendered todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// The authenticated identity performing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub user_id: i64,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Due day has started and the todo is still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => due < overdue_cutoff(now) && !self.is_completed(),
            None => false,
        }
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_incomplete(&mut self, now: DateTime<Utc>) {
        self.completed_at = None;
        self.updated_at = now;
    }
}

/// Smallest due date that is not yet overdue at `now`.
///
/// A due date counts as passed once its midnight (UTC) lies strictly before
/// `now`, so `due_date < overdue_cutoff(now)` is the overdue predicate for
/// both in-memory checks and SQL.
pub fn overdue_cutoff(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    if now.time() == NaiveTime::MIN {
        today
    } else {
        today.succ_opt().unwrap_or(today)
    }
}

/// A todo joined with its owner, as read from the store.
#[derive(Debug, Clone)]
pub struct OwnedTodo {
    pub todo: Todo,
    pub owner: UserSummary,
}

/// Outward representation of a todo with derived state evaluated at render time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoResource {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub is_overdue: bool,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoResource {
    pub fn render(owned: OwnedTodo, now: DateTime<Utc>) -> Self {
        let is_completed = owned.todo.is_completed();
        let is_overdue = owned.todo.is_overdue(now);
        let Todo {
            id,
            title,
            description,
            due_date,
            completed_at,
            created_at,
            updated_at,
            ..
        } = owned.todo;
        TodoResource {
            id,
            title,
            description,
            due_date,
            completed_at,
            is_completed,
            is_overdue,
            user: owned.owner,
            created_at,
            updated_at,
        }
    }
}

/// Fields for a new todo. `user_id` is only honoured for admins. A missing
/// title decodes as empty and is rejected by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub user_id: Option<i64>,
}

/// Partial todo update. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoChanges {
    pub title: Option<String>,
    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub user_id: Option<i64>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.user_id.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
}

/// Partial user update. `role` is ignored on profile self-updates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }
}

/// Listing request as received from the caller.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TodoQuery {
    pub status: Option<StatusFilter>,
    pub user_id: Option<i64>,
    pub page: Option<u32>,
}

/// Store-level todo selection after ownership scoping.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoScope {
    /// Restrict to one owner; `None` means every todo.
    pub owner: Option<i64>,
    pub status: Option<StatusFilter>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, current_page: u32, per_page: u32, total: i64) -> Self {
        let per = i64::from(per_page.max(1));
        let last_page = ((total + per - 1) / per).max(1) as u32;
        Page {
            data,
            current_page,
            per_page,
            total,
            last_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

/// Normalise a requested page number to 1-based.
pub fn page_number(requested: Option<u32>) -> u32 {
    requested.unwrap_or(1).max(1)
}

/// The four todo counters shared by global and personal statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCounts {
    pub total_todos: i64,
    pub completed_todos: i64,
    pub incomplete_todos: i64,
    pub overdue_todos: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCounts {
    #[serde(flatten)]
    pub todos: TodoCounts,
    pub total_users: i64,
    pub users_with_todos: i64,
}

/// Per-user row in the admin statistics breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTodoCount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub todos_count: i64,
    pub completed_todos_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub statistics: GlobalCounts,
    pub todos_by_user: Vec<UserTodoCount>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersonalStatistics {
    pub statistics: TodoCounts,
}

/// Distinguishes an absent field from an explicit `null` in JSON bodies.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(de).map(Some)
    }
}
