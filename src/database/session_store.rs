use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::session::SessionUser;
use crate::utils::token::hash_token;

/// Turns a session cookie value into the user behind it.
///
/// `Ok(None)` means the token is unknown or expired. `Err` means the session
/// backend itself could not be reached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<SessionUser>>;
}

/// Persistence side of sessions. Raw tokens are hashed before they are stored.
/// `create` also drops sessions that have already expired.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()>;

    async fn delete(&self, token: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionResolver for PgSessionStore {
    async fn resolve(&self, token: &str) -> Result<Option<SessionUser>> {
        let row = sqlx::query_as::<_, SessionUser>(
            r#"
            SELECT s.user_id, u.role, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            debug!(purged, "expired sessions removed");
        }

        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
