use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::qrcode::{QrCode, QrCodeCounts};
use crate::services::qrcode_service::QrCodePage;
use crate::utils::params::json_floor;

/// Body of `POST /api/qrcodes`. `jumlah` and `qty` are accepted as aliases of `count`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateQrCodesPayload {
    #[schema(value_type = Option<i64>)]
    pub count: Option<JsonValue>,
    #[schema(value_type = Option<i64>)]
    pub jumlah: Option<JsonValue>,
    #[schema(value_type = Option<i64>)]
    pub qty: Option<JsonValue>,
}

impl CreateQrCodesPayload {
    /// The first non-null of `count`, `jumlah`, `qty`, floored. Unparseable → 0.
    pub fn requested(&self) -> i64 {
        [&self.count, &self.jumlah, &self.qty]
            .into_iter()
            .flatten()
            .find(|v| !v.is_null())
            .and_then(json_floor)
            .unwrap_or(0)
    }
}

/// Body of the scan endpoints. `qrToken` is accepted as an alias.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct TokenPayload {
    #[schema(value_type = Option<String>)]
    pub token: Option<JsonValue>,
    #[serde(rename = "qrToken")]
    #[schema(value_type = Option<String>)]
    pub qr_token: Option<JsonValue>,
}

impl TokenPayload {
    pub fn token(&self) -> Option<&str> {
        [&self.token, &self.qr_token]
            .into_iter()
            .flatten()
            .filter_map(JsonValue::as_str)
            .find(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QrCodeListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecentScansQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeListResponse {
    pub data: Vec<QrCode>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub page_count: i64,
}

impl From<QrCodePage> for QrCodeListResponse {
    fn from(value: QrCodePage) -> Self {
        Self {
            data: value.items,
            page: value.page,
            limit: value.limit,
            total: value.total,
            page_count: value.page_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentScan {
    pub id: Uuid,
    pub token: String,
    pub hadir: bool,
    pub souvenir: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<QrCode> for RecentScan {
    fn from(value: QrCode) -> Self {
        Self {
            id: value.id,
            token: value.token,
            hadir: value.hadir,
            souvenir: value.souvenir,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QrCodeStats {
    pub total: i64,
    pub hadir: i64,
    pub belum: i64,
    pub souvenir: i64,
    /// Percentage of tokens checked in, 0..=100.
    pub rate: f64,
}

impl From<QrCodeCounts> for QrCodeStats {
    fn from(value: QrCodeCounts) -> Self {
        let rate = if value.total > 0 {
            value.hadir as f64 / value.total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total: value.total,
            hadir: value.hadir,
            belum: value.total - value.hadir,
            souvenir: value.souvenir,
            rate,
        }
    }
}
