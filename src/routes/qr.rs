use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{error::Result, AppState};

pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QrImageQuery {
    pub data: Option<String>,
    pub size: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/qr",
    params(
        ("data" = String, Query, description = "Text to encode, usually a token"),
        ("size" = Option<String>, Query, description = "WIDTHxHEIGHT, default 1000x1000")
    ),
    responses(
        (status = 200, description = "QR image bytes with the renderer content type"),
        (status = 400, description = "Missing data or invalid size"),
        (status = 502, description = "Renderer failed or unreachable")
    )
)]
#[axum::debug_handler]
pub async fn qr_image(
    State(state): State<AppState>,
    Query(query): Query<QrImageQuery>,
) -> Result<impl IntoResponse> {
    let image = state
        .qr_image_service
        .fetch(query.data.as_deref(), query.size.as_deref())
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        image.bytes,
    ))
}
