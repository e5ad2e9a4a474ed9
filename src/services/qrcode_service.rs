use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::database::QrCodeStore;
use crate::dto::qrcode_dto::QrCodeStats;
use crate::error::{Error, Result};
use crate::models::qrcode::{MarkOutcome, QrCode, ScanKind};
use crate::utils::params::{page_count, parse_floor, PageRequest};
use crate::utils::token::{generate_access_token, TOKEN_LENGTH};

pub const MAX_BATCH_SIZE: i64 = 5000;
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;
pub const DEFAULT_RECENT_LIMIT: i64 = 5;
pub const MAX_RECENT_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct QrCodeService {
    store: Arc<dyn QrCodeStore>,
}

#[derive(Debug, Clone)]
pub struct QrCodePage {
    pub items: Vec<QrCode>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub page_count: i64,
}

impl QrCodeService {
    pub fn new(store: Arc<dyn QrCodeStore>) -> Self {
        Self { store }
    }

    /// Issues `requested` fresh tokens, capped at [`MAX_BATCH_SIZE`].
    pub async fn create_batch(&self, requested: i64) -> Result<Vec<QrCode>> {
        if requested <= 0 {
            return Err(Error::BadRequest("count harus > 0".to_string()));
        }
        let count = requested.min(MAX_BATCH_SIZE) as usize;

        let mut seen = HashSet::with_capacity(count);
        let mut tokens = Vec::with_capacity(count);
        while tokens.len() < count {
            let token = generate_access_token(TOKEN_LENGTH);
            if seen.insert(token.clone()) {
                tokens.push(token);
            }
        }

        let rows = self.store.insert_batch(&tokens).await?;
        info!(requested, created = rows.len(), "qr codes issued");
        Ok(rows)
    }

    pub async fn list(
        &self,
        page: Option<&str>,
        limit: Option<&str>,
        kind: Option<&str>,
    ) -> Result<QrCodePage> {
        let filter = parse_filter(kind)?;
        let request = PageRequest::from_raw(page, limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

        let total = self.store.count(filter).await?;
        let items = self
            .store
            .list(filter, request.limit, request.offset())
            .await?;

        Ok(QrCodePage {
            items,
            total,
            page: request.page,
            limit: request.limit,
            page_count: page_count(total, request.limit),
        })
    }

    /// Sets `kind` on the token. A second scan of the same token is a conflict
    /// carrying the stored row.
    pub async fn mark(&self, token: &str, kind: ScanKind) -> Result<QrCode> {
        match self.store.mark(token, kind).await? {
            MarkOutcome::Marked(row) => {
                info!(id = %row.id, kind = kind.column(), "qr code scanned");
                Ok(row)
            }
            MarkOutcome::AlreadyMarked(row) => {
                warn!(id = %row.id, kind = kind.column(), "duplicate scan rejected");
                Err(Error::conflict_with(already_marked_message(kind), &row))
            }
            MarkOutcome::NotFound => Err(Error::NotFound("QR not found".to_string())),
        }
    }

    pub async fn check_in(&self, token: &str) -> Result<QrCode> {
        self.mark(token, ScanKind::Hadir).await
    }

    pub async fn claim_souvenir(&self, token: &str) -> Result<QrCode> {
        self.mark(token, ScanKind::Souvenir).await
    }

    /// Latest scans of one kind. Unknown kinds fall back to check-ins.
    pub async fn recent(&self, kind: Option<&str>, limit: Option<&str>) -> Result<Vec<QrCode>> {
        let kind = kind.and_then(ScanKind::parse).unwrap_or(ScanKind::Hadir);
        let limit = parse_floor(limit)
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT);
        self.store.recent(kind, limit).await
    }

    pub async fn stats(&self) -> Result<QrCodeStats> {
        Ok(self.store.counts().await?.into())
    }
}

fn parse_filter(kind: Option<&str>) -> Result<Option<ScanKind>> {
    match kind.map(str::trim).filter(|k| !k.is_empty()) {
        None => Ok(None),
        Some(raw) => ScanKind::parse(raw).map(Some).ok_or_else(|| {
            Error::BadRequest(format!("type must be hadir or souvenir, got {}", raw))
        }),
    }
}

fn already_marked_message(kind: ScanKind) -> &'static str {
    match kind {
        ScanKind::Hadir => "Already checked in",
        ScanKind::Souvenir => "Souvenir already claimed",
    }
}
