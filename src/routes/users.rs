use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dto::user_dto::{CreateUserPayload, UpdateUserPayload, UserListQuery, UserListResponse},
    error::{Error, Result},
    models::{session::SessionUser, user::User},
    services::user_service::ADMIN_ROLE,
    utils::params::lenient_json,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<i64>, Query, description = "Page size, default 10, max 100")
    ),
    responses((status = 200, description = "Page of users, newest first", body = UserListResponse))
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .user_service
        .list(query.page.as_deref(), query.limit.as_deref())
        .await?;
    Ok(Json(UserListResponse::from(page)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Admin account created", body = User),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn create_user(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let payload: CreateUserPayload = lenient_json(&body);
    let user = state.user_service.create(payload, Some(ADMIN_ROLE)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": user })),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "no fields to update"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let id = parse_user_id(&id)?;
    let payload: UpdateUserPayload = lenient_json(&body);
    let user = state.user_service.update(id, payload).await?;
    Ok(Json(json!({ "data": user })))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete your own account"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_user_id(&id)?;
    state.user_service.delete(id, current.user_id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Ids that are not UUIDs cannot name a user.
fn parse_user_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::NotFound("Not found".to_string()))
}
