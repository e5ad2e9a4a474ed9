use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::{
    dto::{auth_dto::SignInPayload, user_dto::MeResponse},
    error::{Error, Result},
    middleware::auth::{expired_cookie, session_cookie, session_token},
    models::session::SessionUser,
    utils::params::lenient_json,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInPayload,
    responses(
        (status = 200, description = "Signed in, session cookie set", body = MeResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
#[axum::debug_handler]
pub async fn sign_in(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let payload: SignInPayload = lenient_json(&body);
    let (user, session) = state.auth_service.sign_in(payload).await?;

    let cookie = session_cookie(
        &state.config.session_cookie_name,
        &session.token,
        state.auth_service.session_ttl().num_seconds(),
        state.config.secure_cookies(),
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "data": MeResponse::from(user) })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    responses((status = 200, description = "Session removed and cookie cleared"))
)]
#[axum::debug_handler]
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Result<impl IntoResponse> {
    let name = &state.config.session_cookie_name;
    if let Some(token) = session_token(&headers, name) {
        state.auth_service.sign_out(&token).await?;
    }
    Ok((
        [(header::SET_COOKIE, expired_cookie(name, state.config.secure_cookies()))],
        Json(json!({ "success": true })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "The signed-in user", body = MeResponse),
        (status = 401, description = "No session"),
        (status = 404, description = "User Not Found")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<SessionUser>,
) -> Result<impl IntoResponse> {
    let user = state
        .user_service
        .get(current.user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User Not Found".to_string()))?;
    Ok(Json(json!({ "data": MeResponse::from(user) })))
}
