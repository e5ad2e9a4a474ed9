use crate::error::{Error, Result};

/// Check-in moved to token scans; this endpoint only answers 410.
#[utoipa::path(
    post,
    path = "/api/participants/checkin",
    responses((status = 410, description = "Endpoint removed, use /api/qrcodes/hadir"))
)]
pub async fn checkin_removed() -> Result<()> {
    Err(Error::Gone("Participants check-in removed".to_string()))
}
