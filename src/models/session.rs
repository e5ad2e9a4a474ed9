use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::split_roles;

/// What the guard learns about the caller from a session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub role: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionUser {
    pub fn roles(&self) -> Vec<&str> {
        split_roles(self.role.as_deref())
    }
}

/// A freshly issued session. `token` is the raw cookie value and is never stored.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
