//! Access-control policy.
//!
//! Every role/ownership branch in the crate goes through these functions.
//! They return decisions; turning a denial into an [`Error`] is left to the
//! caller via [`Decision::into_result`].

use crate::error::{Error, Result};
use crate::models::{Actor, Todo};

/// Actions an actor can take on a single todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoAction {
    View,
    Update,
    Delete,
    Toggle,
}

impl TodoAction {
    fn verb(&self) -> &'static str {
        match self {
            TodoAction::View => "view",
            TodoAction::Update => "update",
            TodoAction::Delete => "delete",
            TodoAction::Toggle => "modify",
        }
    }
}

/// Administrative actions on user accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    List,
    View,
    Update,
    Delete,
    ChangeRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Non-admin acting on someone else's todo.
    NotOwner(TodoAction),
    /// Admin-only capability requested by a regular user.
    AdminOnly,
    /// Admin targeting their own account with a destructive action.
    OwnAccount(UserAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::NotOwner(action)) => Err(Error::AccessDenied(format!(
                "Access denied. You can only {} your own todos.",
                action.verb()
            ))),
            Decision::Deny(DenyReason::AdminOnly) => Err(Error::AccessDenied(
                "Access denied. Admin privileges required.".to_string(),
            )),
            Decision::Deny(DenyReason::OwnAccount(UserAction::Delete)) => Err(
                Error::SelfProtection("You cannot delete your own account".to_string()),
            ),
            Decision::Deny(DenyReason::OwnAccount(_)) => Err(Error::SelfProtection(
                "You cannot change your own role".to_string(),
            )),
        }
    }
}

/// Admins may act on any todo; everyone else only on todos they own.
pub fn authorize_todo(actor: &Actor, todo: &Todo, action: TodoAction) -> Decision {
    if actor.is_admin() || todo.user_id == actor.id {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotOwner(action))
    }
}

pub fn can_access(actor: &Actor, todo: &Todo, action: TodoAction) -> bool {
    authorize_todo(actor, todo, action).is_allowed()
}

/// Only admins may choose or change a todo's owner.
pub fn can_reassign_owner(actor: &Actor) -> bool {
    actor.is_admin()
}

/// Owner a new todo is stored under: the requested one for admins, otherwise
/// the actor. A non-admin's request is dropped, not rejected.
pub fn effective_owner(actor: &Actor, requested: Option<i64>) -> i64 {
    match requested {
        Some(user_id) if can_reassign_owner(actor) => user_id,
        _ => actor.id,
    }
}

/// Owner restriction applied to listings and counts. Non-admins are pinned
/// to their own todos whatever `requested` says; admins may narrow to one user.
pub fn listing_owner(actor: &Actor, requested: Option<i64>) -> Option<i64> {
    if actor.is_admin() {
        requested
    } else {
        Some(actor.id)
    }
}

/// Admin-only user management, with the self-protection invariant:
/// an admin may not delete or change the role of their own account.
pub fn authorize_user(actor: &Actor, target_id: i64, action: UserAction) -> Decision {
    if !actor.is_admin() {
        return Decision::Deny(DenyReason::AdminOnly);
    }
    match action {
        UserAction::Delete | UserAction::ChangeRole if target_id == actor.id => {
            Decision::Deny(DenyReason::OwnAccount(action))
        }
        _ => Decision::Allow,
    }
}

/// Admin-only capabilities: global statistics and the admin route group.
/// Personal statistics and profile access are open to every actor.
pub fn authorize_admin(actor: &Actor) -> Decision {
    if actor.is_admin() {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::AdminOnly)
    }
}
