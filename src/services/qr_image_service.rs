use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client};
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_SIZE: &str = "1000x1000";
pub const MAX_DIMENSION: u32 = 2000;

/// Fetches rendered QR images from an external renderer so browsers can draw
/// them onto a canvas without tripping cross-origin rules.
#[derive(Clone)]
pub struct QrImageService {
    client: Client,
    upstream: Url,
}

#[derive(Debug, Clone)]
pub struct QrImage {
    pub content_type: String,
    pub bytes: Bytes,
}

impl QrImageService {
    pub fn new(upstream: &str, client: Client) -> Result<Self> {
        let upstream = Url::parse(upstream)
            .map_err(|e| Error::Config(format!("Invalid value for QR_UPSTREAM_URL: {}", e)))?;
        Ok(Self { client, upstream })
    }

    pub fn upstream_url(&self, data: &str, size: &str) -> Url {
        let mut url = self.upstream.clone();
        url.query_pairs_mut()
            .append_pair("size", size)
            .append_pair("data", data);
        url
    }

    pub async fn fetch(&self, data: Option<&str>, size: Option<&str>) -> Result<QrImage> {
        let data = data
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::BadRequest("Missing data".to_string()))?;
        let size = normalize_size(size)?;

        let url = self.upstream_url(data, &size);
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "qr renderer unreachable");
            Error::BadGateway("Upstream error".to_string())
        })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "qr renderer returned an error");
            return Err(Error::BadGateway("Upstream error".to_string()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response.bytes().await?;

        info!(size = %size, len = bytes.len(), "qr image proxied");
        Ok(QrImage {
            content_type,
            bytes,
        })
    }
}

/// Accepts `<width>x<height>` with each side in `1..=MAX_DIMENSION`.
pub fn normalize_size(size: Option<&str>) -> Result<String> {
    let raw = match size.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_SIZE.to_string()),
        Some(raw) => raw,
    };
    let invalid = || Error::BadRequest(format!("Invalid size: {}", raw));

    let (w, h) = raw.split_once(['x', 'X']).ok_or_else(invalid)?;
    let parse = |side: &str| -> Result<u32> {
        if side.is_empty() || side.len() > 4 || !side.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u32 = side.parse().map_err(|_| invalid())?;
        if value == 0 || value > MAX_DIMENSION {
            return Err(invalid());
        }
        Ok(value)
    };
    Ok(format!("{}x{}", parse(w)?, parse(h)?))
}
