use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use super::AppState;
use super::errors::AppError;
use super::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::models::{
    GlobalStatistics, NewTodo, Page, PersonalStatistics, Role, StatusFilter, TodoChanges,
    TodoQuery, TodoResource, User, UserChanges,
};
use crate::service::Toggled;

type ApiResult<T> = Result<T, AppError>;

/// Query string for `GET /api/todos`.
#[derive(Debug, Deserialize)]
pub struct ListTodosParams {
    pub status: Option<String>,
    pub user_id: Option<i64>,
    pub page: Option<u32>,
}

impl ListTodosParams {
    fn into_query(self) -> ApiResult<TodoQuery> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<StatusFilter>)
            .transpose()
            .map_err(AppError::Validation)?;
        Ok(TodoQuery {
            status,
            user_id: self.user_id,
            page: self.page,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// -- Profile --

pub async fn profile(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<Value>> {
    let user = state.with_service(|svc| svc.profile(&actor))?;
    Ok(Json(json!({ "user": user })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(changes): ApiJson<UserChanges>,
) -> ApiResult<Json<Value>> {
    let user = state.with_service(|svc| svc.update_profile(&actor, changes))?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user,
    })))
}

// -- Todos --

pub async fn list_todos(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(params): ApiQuery<ListTodosParams>,
) -> ApiResult<Json<Page<TodoResource>>> {
    let query = params.into_query()?;
    let page = state.with_service(|svc| svc.list_todos(&actor, &query))?;
    Ok(Json(page))
}

pub async fn create_todo(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(new): ApiJson<NewTodo>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let todo = state.with_service(|svc| svc.create_todo(&actor, new))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Todo created successfully",
            "todo": todo,
        })),
    ))
}

pub async fn show_todo(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    let todo = state.with_service(|svc| svc.get_todo(&actor, id))?;
    Ok(Json(json!({ "todo": todo })))
}

pub async fn update_todo(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<TodoChanges>,
) -> ApiResult<Json<Value>> {
    let todo = state.with_service(|svc| svc.update_todo(&actor, id, changes))?;
    Ok(Json(json!({
        "message": "Todo updated successfully",
        "todo": todo,
    })))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_service(|svc| svc.delete_todo(&actor, id))?;
    Ok(Json(json!({ "message": "Todo deleted successfully" })))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Toggled>> {
    let toggled = state.with_service(|svc| svc.toggle_complete(&actor, id))?;
    Ok(Json(toggled))
}

pub async fn my_stats(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<PersonalStatistics>> {
    let stats = state.with_service(|svc| svc.personal_stats(&actor))?;
    Ok(Json(stats))
}

// -- Admin --

pub async fn list_users(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<User>>> {
    let users = state.with_service(|svc| svc.list_users(&actor, params.page))?;
    Ok(Json(users))
}

pub async fn show_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    let user = state.with_service(|svc| svc.get_user(&actor, id))?;
    Ok(Json(json!({ "user": user })))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UserChanges>,
) -> ApiResult<Json<Value>> {
    let user = state.with_service(|svc| svc.update_user(&actor, id, changes))?;
    Ok(Json(json!({
        "message": "User updated successfully",
        "user": user,
    })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_service(|svc| svc.delete_user(&actor, id))?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

pub async fn update_role(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<RoleRequest>,
) -> ApiResult<Json<Value>> {
    let user = state.with_service(|svc| svc.update_role(&actor, id, req.role))?;
    Ok(Json(json!({
        "message": "User role updated successfully",
        "user": user,
    })))
}

pub async fn global_stats(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<GlobalStatistics>> {
    let stats = state.with_service(|svc| svc.global_stats(&actor))?;
    Ok(Json(stats))
}
