mod steps;

use std::collections::HashMap;
use std::path::PathBuf;

use cucumber::World;

/// Instant every scenario runs at unless a step pins another one.
pub const SCENARIO_NOW: &str = "2025-06-15T12:00:00Z";

/// Shared state carried through each scenario.
#[derive(Debug, Default, World)]
pub struct TodosWorld {
    /// Temporary directory that owns the database file.
    pub db_dir: Option<tempfile::TempDir>,
    /// Path to the SQLite database file inside `db_dir`.
    pub db_path: Option<PathBuf>,
    /// RFC 3339 instant passed to every `td` invocation as `TD_NOW`.
    pub now: String,
    /// The raw stdout of the most recent `td` invocation.
    pub last_stdout: String,
    /// The raw stderr of the most recent `td` invocation.
    pub last_stderr: String,
    /// Exit code of the most recent `td` invocation.
    pub last_exit_code: i32,
    /// User name to id, populated by account steps.
    pub user_ids: HashMap<String, i64>,
    /// Alias to todo id, populated by create steps.
    pub todo_ids: HashMap<String, i64>,
    /// Port of the in-process API server, once started.
    pub server_port: Option<u16>,
    pub server_handle: Option<tokio::task::JoinHandle<()>>,
    pub http_client: reqwest::Client,
    pub last_response_status: Option<u16>,
    pub last_response_body: Option<String>,
}

impl TodosWorld {
    pub fn user_id(&self, name: &str) -> i64 {
        *self
            .user_ids
            .get(name)
            .unwrap_or_else(|| panic!("unknown user {name:?}; create it in a Given step"))
    }

    pub fn todo_id(&self, alias: &str) -> i64 {
        *self
            .todo_ids
            .get(alias)
            .unwrap_or_else(|| panic!("unknown todo alias {alias:?}"))
    }
}

#[tokio::main]
async fn main() {
    TodosWorld::cucumber()
        .after(|_feature, _rule, _scenario, _ev, world| {
            Box::pin(async move {
                if let Some(handle) = world.and_then(|w| w.server_handle.take()) {
                    handle.abort();
                }
            })
        })
        .run("tests/features")
        .await;
}
