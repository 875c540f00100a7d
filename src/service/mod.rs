//! Actor-aware core operations.
//!
//! Each operation runs policy first, then the scoped query, then the entity
//! mutation, against the store and clock handed to [`Service::new`].

mod stats;
mod todos;
mod users;

pub use todos::Toggled;

use chrono::{DateTime, NaiveDate, Utc};

use crate::clock::Clock;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::Actor;

pub struct Service<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> Service<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Service { db, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Look up the stored role for an authenticated user id.
    pub fn resolve_actor(&self, user_id: i64) -> Result<Actor> {
        let user = self
            .db
            .get_user(user_id)?
            .ok_or_else(|| Error::user_not_found(user_id))?;
        Ok(Actor::from(&user))
    }
}

fn require_present(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("The {field} field is required.")));
    }
    Ok(())
}

/// Upper bound on string columns, in characters.
const MAX_LEN: usize = 255;

fn require_max_len(field: &str, value: &str) -> Result<()> {
    if value.chars().count() > MAX_LEN {
        return Err(Error::Validation(format!(
            "The {field} field must not be greater than {MAX_LEN} characters."
        )));
    }
    Ok(())
}

/// Due dates may be today or later, judged by the UTC date of `now`.
fn require_not_past(due: NaiveDate, now: DateTime<Utc>) -> Result<()> {
    if due < now.date_naive() {
        return Err(Error::Validation(
            "The due date field must be a date after or equal to today.".to_string(),
        ));
    }
    Ok(())
}

fn require_title(value: &str) -> Result<()> {
    require_present("title", value)?;
    require_max_len("title", value)
}

fn require_name(value: &str) -> Result<()> {
    require_present("name", value)?;
    require_max_len("name", value)
}

fn require_email(value: &str) -> Result<()> {
    require_present("email", value)?;
    require_max_len("email", value)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };
    if !valid {
        return Err(Error::Validation(
            "The email field must be a valid email address.".to_string(),
        ));
    }
    Ok(())
}
