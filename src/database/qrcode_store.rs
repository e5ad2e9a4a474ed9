use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::qrcode::{MarkOutcome, QrCode, QrCodeCounts, ScanKind};

const QRCODE_COLUMNS: &str = "id, token, hadir, souvenir, created_at, updated_at";

#[async_trait]
pub trait QrCodeStore: Send + Sync {
    /// Inserts one unmarked row per token, all or nothing.
    async fn insert_batch(&self, tokens: &[String]) -> Result<Vec<QrCode>>;

    async fn count(&self, filter: Option<ScanKind>) -> Result<i64>;

    /// Newest first, ties broken by id.
    async fn list(&self, filter: Option<ScanKind>, limit: i64, offset: i64) -> Result<Vec<QrCode>>;

    async fn find_by_token(&self, token: &str) -> Result<Option<QrCode>>;

    /// Flips `kind` from false to true in one step. Concurrent callers for the
    /// same token see exactly one `Marked`.
    async fn mark(&self, token: &str, kind: ScanKind) -> Result<MarkOutcome>;

    /// Rows with `kind` set, most recently updated first.
    async fn recent(&self, kind: ScanKind, limit: i64) -> Result<Vec<QrCode>>;

    async fn counts(&self) -> Result<QrCodeCounts>;
}

#[derive(Clone)]
pub struct PgQrCodeStore {
    pool: PgPool,
}

impl PgQrCodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QrCodeStore for PgQrCodeStore {
    async fn insert_batch(&self, tokens: &[String]) -> Result<Vec<QrCode>> {
        let query = format!(
            "INSERT INTO qrcodes (token)
             SELECT * FROM UNNEST($1::text[])
             RETURNING {}",
            QRCODE_COLUMNS
        );
        let rows = sqlx::query_as::<_, QrCode>(&query)
            .bind(tokens)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, filter: Option<ScanKind>) -> Result<i64> {
        let query = format!("SELECT COUNT(*) FROM qrcodes {}", where_flag(filter));
        let total = sqlx::query_scalar::<_, i64>(&query)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn list(&self, filter: Option<ScanKind>, limit: i64, offset: i64) -> Result<Vec<QrCode>> {
        let query = format!(
            "SELECT {}
             FROM qrcodes
             {}
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2",
            QRCODE_COLUMNS,
            where_flag(filter)
        );
        let rows = sqlx::query_as::<_, QrCode>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<QrCode>> {
        let query = format!("SELECT {} FROM qrcodes WHERE token = $1", QRCODE_COLUMNS);
        let row = sqlx::query_as::<_, QrCode>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn mark(&self, token: &str, kind: ScanKind) -> Result<MarkOutcome> {
        let column = kind.column();
        let query = format!(
            "UPDATE qrcodes
             SET {column} = TRUE, updated_at = NOW()
             WHERE token = $1 AND {column} = FALSE
             RETURNING {columns}",
            column = column,
            columns = QRCODE_COLUMNS
        );
        let updated = sqlx::query_as::<_, QrCode>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = updated {
            return Ok(MarkOutcome::Marked(row));
        }

        Ok(match self.find_by_token(token).await? {
            Some(existing) => MarkOutcome::AlreadyMarked(existing),
            None => MarkOutcome::NotFound,
        })
    }

    async fn recent(&self, kind: ScanKind, limit: i64) -> Result<Vec<QrCode>> {
        let query = format!(
            "SELECT {}
             FROM qrcodes
             {}
             ORDER BY updated_at DESC, id DESC
             LIMIT $1",
            QRCODE_COLUMNS,
            where_flag(Some(kind))
        );
        let rows = sqlx::query_as::<_, QrCode>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn counts(&self) -> Result<QrCodeCounts> {
        let counts = sqlx::query_as::<_, QrCodeCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE hadir) AS hadir,
                COUNT(*) FILTER (WHERE souvenir) AS souvenir
            FROM qrcodes
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}

fn where_flag(filter: Option<ScanKind>) -> String {
    match filter {
        Some(kind) => format!("WHERE {} = TRUE", kind.column()),
        None => String::new(),
    }
}
