use serde::Serialize;
use tracing::{debug, info, warn};

use super::{Service, require_not_past, require_title};
use crate::error::{Error, Result};
use crate::models::{
    Actor, NewTodo, OwnedTodo, PER_PAGE, Page, Todo, TodoChanges, TodoQuery, TodoResource,
    TodoScope, page_number,
};
use crate::policy::{self, TodoAction};

/// Result of flipping a todo's completion state.
#[derive(Debug, Clone, Serialize)]
pub struct Toggled {
    pub message: &'static str,
    pub todo: TodoResource,
}

impl Service<'_> {
    /// Newest-first page of the todos visible to `actor`.
    pub fn list_todos(&self, actor: &Actor, query: &TodoQuery) -> Result<Page<TodoResource>> {
        let scope = TodoScope {
            owner: policy::listing_owner(actor, query.user_id),
            status: query.status,
        };
        let page = page_number(query.page);
        let now = self.clock.now();
        debug!(actor = actor.id, owner = ?scope.owner, status = ?scope.status, page, "listing todos");

        let todos = self.db.list_todos(&scope, now, page, PER_PAGE)?;
        Ok(todos.map(|t| TodoResource::render(t, now)))
    }

    pub fn create_todo(&self, actor: &Actor, new: NewTodo) -> Result<TodoResource> {
        let now = self.clock.now();
        require_title(&new.title)?;
        if let Some(due) = new.due_date {
            require_not_past(due, now)?;
        }

        if new.user_id.is_some() && !policy::can_reassign_owner(actor) {
            debug!(actor = actor.id, requested = ?new.user_id, "ignoring owner requested by non-admin");
        }
        let owner = policy::effective_owner(actor, new.user_id);
        if owner != actor.id {
            self.ensure_user_exists(owner)?;
        }

        let todo = self.db.insert_todo(&new, owner, now)?;
        info!(todo = todo.id, owner, actor = actor.id, "todo created");
        self.render(todo.id)
    }

    pub fn get_todo(&self, actor: &Actor, id: i64) -> Result<TodoResource> {
        let owned = self.authorized(actor, id, TodoAction::View)?;
        Ok(TodoResource::render(owned, self.clock.now()))
    }

    /// Update fields; a non-admin's `user_id` is dropped silently.
    pub fn update_todo(
        &self,
        actor: &Actor,
        id: i64,
        mut changes: TodoChanges,
    ) -> Result<TodoResource> {
        self.authorized(actor, id, TodoAction::Update)?;

        let now = self.clock.now();
        if let Some(title) = &changes.title {
            require_title(title)?;
        }
        if let Some(Some(due)) = changes.due_date {
            require_not_past(due, now)?;
        }
        match changes.user_id {
            Some(_) if !policy::can_reassign_owner(actor) => {
                debug!(actor = actor.id, todo = id, "ignoring owner change by non-admin");
                changes.user_id = None;
            }
            Some(owner) => self.ensure_user_exists(owner)?,
            None => {}
        }

        self.db.update_todo(id, &changes, now)?;
        info!(todo = id, actor = actor.id, "todo updated");
        self.render(id)
    }

    pub fn delete_todo(&self, actor: &Actor, id: i64) -> Result<()> {
        self.authorized(actor, id, TodoAction::Delete)?;
        self.db.delete_todo(id)?;
        info!(todo = id, actor = actor.id, "todo deleted");
        Ok(())
    }

    /// Flip completion: completed todos are reopened, open ones completed.
    pub fn toggle_complete(&self, actor: &Actor, id: i64) -> Result<Toggled> {
        let OwnedTodo { mut todo, owner } = self.authorized(actor, id, TodoAction::Toggle)?;
        let now = self.clock.now();

        let message = if todo.is_completed() {
            todo.mark_incomplete(now);
            "Todo marked as incomplete"
        } else {
            todo.mark_completed(now);
            "Todo marked as completed"
        };
        self.persist_completion(&todo)?;
        info!(todo = id, actor = actor.id, completed = todo.is_completed(), "todo toggled");

        Ok(Toggled {
            message,
            todo: TodoResource::render(OwnedTodo { todo, owner }, now),
        })
    }

    /// Load a todo and run the policy for `action` against it.
    fn authorized(&self, actor: &Actor, id: i64, action: TodoAction) -> Result<OwnedTodo> {
        let owned = self
            .db
            .get_todo(id)?
            .ok_or_else(|| Error::todo_not_found(id))?;
        policy::authorize_todo(actor, &owned.todo, action)
            .into_result()
            .inspect_err(|_| warn!(actor = actor.id, todo = id, ?action, "todo access denied"))?;
        Ok(owned)
    }

    /// Write back completion state; the row may have been deleted since it was read.
    pub(super) fn persist_completion(&self, todo: &Todo) -> Result<()> {
        if !self.db.save_completion(todo)? {
            return Err(Error::todo_not_found(todo.id));
        }
        Ok(())
    }

    fn render(&self, id: i64) -> Result<TodoResource> {
        let owned = self
            .db
            .get_todo(id)?
            .ok_or_else(|| Error::todo_not_found(id))?;
        Ok(TodoResource::render(owned, self.clock.now()))
    }

    fn ensure_user_exists(&self, id: i64) -> Result<()> {
        self.db
            .get_user(id)?
            .map(|_| ())
            .ok_or_else(|| Error::user_not_found(id))
    }
}
