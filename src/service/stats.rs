use chrono::{DateTime, Utc};
use tracing::warn;

use super::Service;
use crate::error::Result;
use crate::models::{
    Actor, GlobalCounts, GlobalStatistics, PersonalStatistics, StatusFilter, TodoCounts, TodoScope,
};
use crate::policy;

impl Service<'_> {
    /// Counts across every user plus a per-user breakdown. Admin only.
    pub fn global_stats(&self, actor: &Actor) -> Result<GlobalStatistics> {
        policy::authorize_admin(actor)
            .into_result()
            .inspect_err(|_| warn!(actor = actor.id, "global statistics denied"))?;

        let now = self.clock.now();
        let statistics = GlobalCounts {
            todos: self.todo_counts(None, now)?,
            total_users: self.db.count_users()?,
            users_with_todos: self.db.count_users_with_todos()?,
        };
        Ok(GlobalStatistics {
            statistics,
            todos_by_user: self.db.todo_counts_by_user()?,
        })
    }

    /// The actor's own four counters.
    pub fn personal_stats(&self, actor: &Actor) -> Result<PersonalStatistics> {
        let statistics = self.todo_counts(Some(actor.id), self.clock.now())?;
        Ok(PersonalStatistics { statistics })
    }

    fn todo_counts(&self, owner: Option<i64>, now: DateTime<Utc>) -> Result<TodoCounts> {
        let count = |status: Option<StatusFilter>| self.db.count_todos(&TodoScope { owner, status }, now);
        Ok(TodoCounts {
            total_todos: count(None)?,
            completed_todos: count(Some(StatusFilter::Completed))?,
            incomplete_todos: count(Some(StatusFilter::Incomplete))?,
            overdue_todos: count(Some(StatusFilter::Overdue))?,
        })
    }
}
