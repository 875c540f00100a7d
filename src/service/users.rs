use tracing::{info, warn};

use super::{Service, require_email, require_name};
use crate::error::{Error, Result};
use crate::models::{Actor, NewUser, PER_PAGE, Page, Role, User, UserChanges, page_number};
use crate::policy::{self, UserAction};

impl Service<'_> {
    /// Create an account. Called by the provisioning side (CLI, seeding), not
    /// by an actor, so no policy applies.
    pub fn register_user(&self, new: NewUser) -> Result<User> {
        require_name(&new.name)?;
        require_email(&new.email)?;
        let user = self.db.insert_user(&new, self.clock.now())?;
        info!(user = user.id, role = %user.role, "user registered");
        Ok(user)
    }

    pub fn profile(&self, actor: &Actor) -> Result<User> {
        self.find_user(actor.id)
    }

    /// Self-service update of name, email and password hash. Role is never
    /// changed through the profile.
    pub fn update_profile(&self, actor: &Actor, mut changes: UserChanges) -> Result<User> {
        changes.role = None;
        validate_changes(&changes)?;
        if !self.db.update_user(actor.id, &changes, self.clock.now())? {
            return Err(Error::user_not_found(actor.id));
        }
        info!(user = actor.id, "profile updated");
        self.find_user(actor.id)
    }

    pub fn list_users(&self, actor: &Actor, page: Option<u32>) -> Result<Page<User>> {
        self.authorize(actor, actor.id, UserAction::List)?;
        self.db.list_users(page_number(page), PER_PAGE)
    }

    pub fn get_user(&self, actor: &Actor, id: i64) -> Result<User> {
        self.authorize(actor, id, UserAction::View)?;
        self.find_user(id)
    }

    /// Admin update of any account. Setting `role` counts as a role change and
    /// is subject to self-protection.
    pub fn update_user(&self, actor: &Actor, id: i64, changes: UserChanges) -> Result<User> {
        self.authorize(actor, id, UserAction::Update)?;
        self.find_user(id)?;
        if changes.role.is_some() {
            self.authorize(actor, id, UserAction::ChangeRole)?;
        }
        validate_changes(&changes)?;

        self.db.update_user(id, &changes, self.clock.now())?;
        info!(user = id, actor = actor.id, "user updated");
        self.find_user(id)
    }

    /// Delete an account and, by cascade, its todos.
    pub fn delete_user(&self, actor: &Actor, id: i64) -> Result<()> {
        self.authorize(actor, id, UserAction::Delete)?;
        if !self.db.delete_user(id)? {
            return Err(Error::user_not_found(id));
        }
        info!(user = id, actor = actor.id, "user deleted");
        Ok(())
    }

    pub fn update_role(&self, actor: &Actor, id: i64, role: Role) -> Result<User> {
        self.authorize(actor, id, UserAction::ChangeRole)?;
        self.find_user(id)?;
        let changes = UserChanges {
            role: Some(role),
            ..UserChanges::default()
        };
        self.db.update_user(id, &changes, self.clock.now())?;
        info!(user = id, actor = actor.id, %role, "user role changed");
        self.find_user(id)
    }

    fn authorize(&self, actor: &Actor, target: i64, action: UserAction) -> Result<()> {
        policy::authorize_user(actor, target, action)
            .into_result()
            .inspect_err(|_| warn!(actor = actor.id, target, ?action, "user action denied"))
    }

    fn find_user(&self, id: i64) -> Result<User> {
        self.db
            .get_user(id)?
            .ok_or_else(|| Error::user_not_found(id))
    }
}

fn validate_changes(changes: &UserChanges) -> Result<()> {
    if let Some(name) = &changes.name {
        require_name(name)?;
    }
    if let Some(email) = &changes.email {
        require_email(email)?;
    }
    Ok(())
}
