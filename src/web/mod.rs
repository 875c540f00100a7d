use axum::{
    Router, middleware,
    routing::{get, patch, put},
};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::clock::Clock;
use crate::db::Database;
use crate::service::Service;

mod errors;
mod extract;
mod handlers;

pub use errors::AppError;
pub use extract::{ApiJson, ApiPath, ApiQuery, CurrentActor, USER_ID_HEADER};

/// Shared application state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        AppState {
            db: Arc::new(Mutex::new(db)),
            clock,
        }
    }

    /// Run a core operation with the database locked for its duration.
    pub fn with_service<T>(
        &self,
        op: impl FnOnce(&Service<'_>) -> crate::Result<T>,
    ) -> Result<T, AppError> {
        let db = self.db.lock().map_err(|_| {
            error!("database mutex poisoned");
            AppError::Internal("Internal server error".to_string())
        })?;
        let svc = Service::new(&db, self.clock.as_ref());
        op(&svc).map_err(AppError::from)
    }
}

/// Build the axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/users", get(handlers::list_users))
        .route(
            "/users/{id}",
            get(handlers::show_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users/{id}/role", put(handlers::update_role))
        .route("/todo-stats", get(handlers::global_stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            extract::require_admin,
        ));

    let api = Router::new()
        .route(
            "/profile",
            get(handlers::profile).put(handlers::update_profile),
        )
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/{id}",
            get(handlers::show_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .route("/todos/{id}/toggle", patch(handlers::toggle_todo))
        .route("/my-todo-stats", get(handlers::my_stats))
        .nest("/admin", admin);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server on `addr` and run until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> std::io::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("todo API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
        return;
    }
    info!("shutting down");
}
