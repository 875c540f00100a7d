/// Injectable time source for overdue and completion timestamps.
pub mod clock;
/// Database layer: open, migrate, CRUD, scoped queries and counts.
pub mod db;
/// Error taxonomy shared by every core operation.
pub mod error;
/// Data types: User, Todo, Actor, filters and pages.
pub mod models;
/// Role and ownership rules for todo and user actions.
pub mod policy;
/// Demo accounts and todos.
pub mod seed;
/// Actor-aware operations: todos, users, statistics.
pub mod service;
/// Axum-based JSON API.
pub mod web;

pub use error::{Error, Result};
