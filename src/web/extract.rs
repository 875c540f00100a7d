use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use super::AppState;
use super::errors::AppError;
use crate::error::Error;
use crate::models::Actor;
use crate::policy;

/// Header carrying the user id authenticated by the upstream proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated actor for the current request, with its role read fresh
/// from the store.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or(AppError::Unauthorized)?;

        match state.with_service(|svc| svc.resolve_actor(user_id)) {
            Ok(actor) => Ok(CurrentActor(actor)),
            Err(AppError::NotFound(_)) => {
                warn!(user_id, "request for unknown user");
                Err(AppError::Unauthorized)
            }
            Err(e) => Err(e),
        }
    }
}

/// Route guard for the `/api/admin` group.
pub async fn require_admin(
    CurrentActor(actor): CurrentActor,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    policy::authorize_admin(&actor)
        .into_result()
        .map_err(|e: Error| {
            warn!(actor = actor.id, path = %req.uri().path(), "admin route denied");
            AppError::from(e)
        })?;
    Ok(next.run(req).await)
}

/// `Json` whose rejection is an [`AppError`], so decode failures keep the
/// `{"message"}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, AppError> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// `Query` counterpart of [`ApiJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, AppError> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}

/// `Path` counterpart of [`ApiJson`].
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, AppError> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}
