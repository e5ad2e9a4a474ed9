use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One attendance slot. The `token` is what gets printed into the QR image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub id: Uuid,
    pub token: String,
    pub hadir: bool,
    pub souvenir: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The two flags a scan can flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    Hadir,
    Souvenir,
}

impl ScanKind {
    pub fn column(self) -> &'static str {
        match self {
            ScanKind::Hadir => "hadir",
            ScanKind::Souvenir => "souvenir",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hadir" => Some(ScanKind::Hadir),
            "souvenir" => Some(ScanKind::Souvenir),
            _ => None,
        }
    }

    pub fn is_set(self, row: &QrCode) -> bool {
        match self {
            ScanKind::Hadir => row.hadir,
            ScanKind::Souvenir => row.souvenir,
        }
    }
}

/// Result of a test-and-set on one flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked(QrCode),
    AlreadyMarked(QrCode),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, FromRow)]
pub struct QrCodeCounts {
    pub total: i64,
    pub hadir: i64,
    pub souvenir: i64,
}
