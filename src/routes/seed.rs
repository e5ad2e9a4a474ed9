use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{
    dto::{auth_dto::SeedPayload, user_dto::CreateUserPayload},
    error::{Error, Result},
    services::user_service::ADMIN_ROLE,
    utils::params::lenient_json,
    AppState,
};

/// Bootstraps the first admin account. Only available with `ENABLE_SEED=1`.
#[utoipa::path(
    post,
    path = "/api/seed",
    request_body = SeedPayload,
    responses(
        (status = 200, description = "Admin account created"),
        (status = 400, description = "Account could not be created"),
        (status = 403, description = "Seed disabled")
    )
)]
#[axum::debug_handler]
pub async fn seed(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let config = &state.config;
    if !config.enable_seed {
        return Err(Error::Forbidden("Seed disabled".to_string()));
    }

    let body: SeedPayload = lenient_json(&body);
    let pick = |value: Option<String>, fallback: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };
    let payload = CreateUserPayload {
        email: Some(pick(body.email, &config.seed_admin_email)),
        password: Some(pick(body.password, &config.seed_admin_password)),
        name: Some(pick(body.name, &config.seed_admin_name)),
    };

    let user = state
        .user_service
        .create(payload, Some(ADMIN_ROLE))
        .await
        .map_err(|e| {
            let message = match e {
                Error::Conflict { message, .. } => message,
                Error::BadRequest(message) => message,
                other => other.to_string(),
            };
            Error::BadRequest(message)
        })?;

    Ok(Json(json!({ "success": true, "email": user.email })))
}
