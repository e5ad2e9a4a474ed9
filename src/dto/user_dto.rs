use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;
use crate::services::user_service::UserPage;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Body of `POST /api/users`. Every field is required, presence is checked before validation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateUserPayload {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewAccount {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

impl CreateUserPayload {
    pub fn into_account(self) -> Option<NewAccount> {
        Some(NewAccount {
            email: self.email?,
            password: self.password?,
            name: self.name?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            image: value.image,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub data: Vec<UserSummary>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub page_count: i64,
}

impl From<UserPage> for UserListResponse {
    fn from(value: UserPage) -> Self {
        Self {
            data: value.items.into_iter().map(Into::into).collect(),
            page: value.page,
            limit: value.limit,
            total: value.total,
            page_count: value.page_count,
        }
    }
}

/// The caller's own profile, as returned by `/api/me` and sign-in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl From<User> for MeResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            image: value.image,
        }
    }
}
