//! In-process stores with the same semantics as the Postgres ones.
//!
//! Used by the test suite and handy for running the HTTP layer without a
//! database. Every operation takes a single mutex, so `mark` keeps its
//! test-and-set guarantee.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{QrCodeStore, SessionResolver, SessionStore, UserStore};
use crate::error::{Error, Result};
use crate::models::qrcode::{MarkOutcome, QrCode, QrCodeCounts, ScanKind};
use crate::models::session::SessionUser;
use crate::models::user::{NewUser, User, UserChanges};
use crate::utils::token::hash_token;

#[derive(Debug, Default)]
struct MemoryState {
    qrcodes: Vec<QrCode>,
    users: Vec<User>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn newest_first(a: &QrCode, b: &QrCode) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

fn matches(filter: Option<ScanKind>, row: &QrCode) -> bool {
    filter.map_or(true, |kind| kind.is_set(row))
}

fn page<T: Clone>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl QrCodeStore for MemoryStore {
    async fn insert_batch(&self, tokens: &[String]) -> Result<Vec<QrCode>> {
        let mut state = self.lock();
        if tokens
            .iter()
            .any(|t| state.qrcodes.iter().any(|row| &row.token == t))
        {
            return Err(Error::conflict("duplicate token"));
        }
        let now = Utc::now();
        let rows: Vec<QrCode> = tokens
            .iter()
            .map(|token| QrCode {
                id: Uuid::new_v4(),
                token: token.clone(),
                hadir: false,
                souvenir: false,
                created_at: now,
                updated_at: now,
            })
            .collect();
        state.qrcodes.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn count(&self, filter: Option<ScanKind>) -> Result<i64> {
        let state = self.lock();
        Ok(state.qrcodes.iter().filter(|r| matches(filter, r)).count() as i64)
    }

    async fn list(&self, filter: Option<ScanKind>, limit: i64, offset: i64) -> Result<Vec<QrCode>> {
        let state = self.lock();
        let mut rows: Vec<QrCode> = state
            .qrcodes
            .iter()
            .filter(|r| matches(filter, r))
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        Ok(page(rows, limit, offset))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<QrCode>> {
        let state = self.lock();
        Ok(state.qrcodes.iter().find(|r| r.token == token).cloned())
    }

    async fn mark(&self, token: &str, kind: ScanKind) -> Result<MarkOutcome> {
        let mut state = self.lock();
        let Some(row) = state.qrcodes.iter_mut().find(|r| r.token == token) else {
            return Ok(MarkOutcome::NotFound);
        };
        if kind.is_set(row) {
            return Ok(MarkOutcome::AlreadyMarked(row.clone()));
        }
        match kind {
            ScanKind::Hadir => row.hadir = true,
            ScanKind::Souvenir => row.souvenir = true,
        }
        row.updated_at = Utc::now();
        Ok(MarkOutcome::Marked(row.clone()))
    }

    async fn recent(&self, kind: ScanKind, limit: i64) -> Result<Vec<QrCode>> {
        let state = self.lock();
        let mut rows: Vec<QrCode> = state
            .qrcodes
            .iter()
            .filter(|r| kind.is_set(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(page(rows, limit, 0))
    }

    async fn counts(&self) -> Result<QrCodeCounts> {
        let state = self.lock();
        Ok(QrCodeCounts {
            total: state.qrcodes.len() as i64,
            hadir: state.qrcodes.iter().filter(|r| r.hadir).count() as i64,
            souvenir: state.qrcodes.iter().filter(|r| r.souvenir).count() as i64,
        })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn count(&self) -> Result<i64> {
        Ok(self.lock().users.len() as i64)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let mut rows = self.lock().users.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(rows, limit, offset))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(Error::conflict("Email already registered"));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            image: None,
            role: user.role,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let mut state = self.lock();
        if let Some(email) = &changes.email {
            if state.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(Error::conflict("Email already registered"));
            }
        }
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(image) = changes.image {
            user.image = Some(image);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.lock();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        let deleted = state.users.len() < before;
        if deleted {
            state.sessions.retain(|_, (user_id, _)| *user_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl SessionResolver for MemoryStore {
    async fn resolve(&self, token: &str) -> Result<Option<SessionUser>> {
        let state = self.lock();
        let Some((user_id, expires_at)) = state.sessions.get(&hash_token(token)).copied() else {
            return Ok(None);
        };
        if expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| SessionUser {
                user_id,
                role: u.role.clone(),
                expires_at,
            }))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        let now = Utc::now();
        let mut state = self.lock();
        state.sessions.retain(|_, (_, expires)| *expires > now);
        state
            .sessions
            .insert(hash_token(token), (user_id, expires_at));
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.lock().sessions.remove(&hash_token(token));
        Ok(())
    }
}
