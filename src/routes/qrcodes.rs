use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    dto::qrcode_dto::{
        CreateQrCodesPayload, QrCodeListQuery, QrCodeListResponse, QrCodeStats, RecentScan,
        RecentScansQuery, TokenPayload,
    },
    error::{Error, Result},
    models::qrcode::{QrCode, ScanKind},
    utils::params::lenient_json,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/qrcodes",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<i64>, Query, description = "Page size, default 50, max 500"),
        ("type" = Option<String>, Query, description = "Only rows with this flag set: hadir or souvenir")
    ),
    responses(
        (status = 200, description = "Page of tokens, newest first", body = QrCodeListResponse),
        (status = 400, description = "Unknown type filter"),
        (status = 401, description = "No session"),
        (status = 403, description = "Not an admin")
    )
)]
#[axum::debug_handler]
pub async fn list_qrcodes(
    State(state): State<AppState>,
    Query(query): Query<QrCodeListQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .qrcode_service
        .list(
            query.page.as_deref(),
            query.limit.as_deref(),
            query.kind.as_deref(),
        )
        .await?;
    Ok(Json(QrCodeListResponse::from(page)))
}

#[utoipa::path(
    post,
    path = "/api/qrcodes",
    request_body = CreateQrCodesPayload,
    responses(
        (status = 201, description = "Tokens issued", body = [QrCode]),
        (status = 400, description = "count must be greater than zero")
    )
)]
#[axum::debug_handler]
pub async fn create_qrcodes(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let payload: CreateQrCodesPayload = lenient_json(&body);
    let rows = state.qrcode_service.create_batch(payload.requested()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": rows }))))
}

#[utoipa::path(
    post,
    path = "/api/qrcodes/hadir",
    request_body = TokenPayload,
    responses(
        (status = 200, description = "Checked in", body = QrCode),
        (status = 400, description = "token is required"),
        (status = 404, description = "QR not found"),
        (status = 409, description = "Already checked in, body carries the stored row")
    )
)]
#[axum::debug_handler]
pub async fn mark_hadir(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    scan(&state, &body, ScanKind::Hadir).await
}

#[utoipa::path(
    post,
    path = "/api/qrcodes/souvenir",
    request_body = TokenPayload,
    responses(
        (status = 200, description = "Souvenir recorded", body = QrCode),
        (status = 400, description = "token is required"),
        (status = 404, description = "QR not found"),
        (status = 409, description = "Souvenir already claimed, body carries the stored row")
    )
)]
#[axum::debug_handler]
pub async fn mark_souvenir(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    scan(&state, &body, ScanKind::Souvenir).await
}

async fn scan(state: &AppState, body: &[u8], kind: ScanKind) -> Result<Json<serde_json::Value>> {
    let payload: TokenPayload = lenient_json(body);
    let token = payload
        .token()
        .ok_or_else(|| Error::BadRequest("token is required".to_string()))?;
    let row = state.qrcode_service.mark(token, kind).await?;
    Ok(Json(json!({ "data": row })))
}

pub async fn scan_options() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(header::ALLOW, "POST, OPTIONS")])
}

#[utoipa::path(
    get,
    path = "/api/qrcodes/recent",
    params(
        ("type" = Option<String>, Query, description = "hadir (default) or souvenir"),
        ("limit" = Option<i64>, Query, description = "Number of rows, 1 to 50, default 5")
    ),
    responses((status = 200, description = "Most recent scans", body = [RecentScan]))
)]
#[axum::debug_handler]
pub async fn recent_scans(
    State(state): State<AppState>,
    Query(query): Query<RecentScansQuery>,
) -> Result<impl IntoResponse> {
    let rows = state
        .qrcode_service
        .recent(query.kind.as_deref(), query.limit.as_deref())
        .await?;
    let data: Vec<RecentScan> = rows.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "data": data })))
}

#[utoipa::path(
    get,
    path = "/api/qrcodes/stats",
    responses((status = 200, description = "Attendance totals", body = QrCodeStats))
)]
#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.qrcode_service.stats().await?;
    Ok(Json(json!({ "data": stats })))
}
