pub mod account_steps;
pub mod stats_steps;
pub mod todo_steps;
pub mod web_steps;
