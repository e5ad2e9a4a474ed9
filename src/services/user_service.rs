use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::database::UserStore;
use crate::dto::user_dto::{CreateUserPayload, UpdateUserPayload};
use crate::error::{Error, Result};
use crate::models::user::{NewUser, User, UserChanges};
use crate::utils::crypto::hash_password;
use crate::utils::params::{page_count, PageRequest};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const ADMIN_ROLE: &str = "admin";

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub items: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub page_count: i64,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, page: Option<&str>, limit: Option<&str>) -> Result<UserPage> {
        let request = PageRequest::from_raw(page, limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let total = self.store.count().await?;
        let items = self.store.list(request.limit, request.offset()).await?;
        Ok(UserPage {
            items,
            total,
            page: request.page,
            limit: request.limit,
            page_count: page_count(total, request.limit),
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>> {
        self.store.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.store.find_by_email(&normalize_email(email)).await
    }

    /// Registers an account with the given role. Emails are stored lower-cased.
    pub async fn create(&self, payload: CreateUserPayload, role: Option<&str>) -> Result<User> {
        let mut account = payload
            .into_account()
            .ok_or_else(|| Error::BadRequest("email, password, name required".to_string()))?;
        account.email = normalize_email(&account.email);
        account.name = account.name.trim().to_string();
        account.validate()?;

        let password_hash = hash_password(&account.password)?;

        let user = self
            .store
            .create(NewUser {
                name: account.name,
                email: account.email,
                password_hash,
                role: role.map(str::to_string),
            })
            .await?;

        info!(user_id = %user.id, role = ?user.role, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateUserPayload) -> Result<User> {
        let payload = UpdateUserPayload {
            name: non_blank(payload.name).map(|n| n.trim().to_string()),
            email: non_blank(payload.email).map(|e| normalize_email(&e)),
            image: non_blank(payload.image),
        };
        let changes = UserChanges {
            name: payload.name.clone(),
            email: payload.email.clone(),
            image: payload.image.clone(),
        };
        if changes.is_empty() {
            return Err(Error::BadRequest("no fields to update".to_string()));
        }
        payload.validate()?;

        self.store
            .update(id, changes)
            .await?
            .ok_or_else(|| Error::NotFound("Not found".to_string()))
    }

    /// Deletes another account. Admins cannot delete themselves.
    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<()> {
        if id == acting_user {
            return Err(Error::BadRequest(
                "Tidak bisa menghapus akun sendiri".to_string(),
            ));
        }
        if !self.store.delete(id).await? {
            return Err(Error::NotFound("Not found".to_string()));
        }
        info!(user_id = %id, deleted_by = %acting_user, "user deleted");
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
