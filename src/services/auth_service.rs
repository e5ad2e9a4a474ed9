use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use validator::Validate;

use crate::database::{SessionResolver, SessionStore, UserStore};
use crate::dto::auth_dto::SignInPayload;
use crate::error::{Error, Result};
use crate::models::session::{IssuedSession, SessionUser};
use crate::models::user::User;
use crate::services::user_service::normalize_email;
use crate::utils::crypto::{dummy_hash, verify_password};
use crate::utils::token::{generate_access_token, TOKEN_LENGTH};

/// Email/password sign-in backed by server-side sessions.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    resolver: Arc<dyn SessionResolver>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        resolver: Arc<dyn SessionResolver>,
        session_ttl_hours: i64,
    ) -> Self {
        Self {
            users,
            sessions,
            resolver,
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    pub fn resolver(&self) -> &dyn SessionResolver {
        self.resolver.as_ref()
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn sign_in(&self, payload: SignInPayload) -> Result<(User, IssuedSession)> {
        payload.validate()?;
        let email = normalize_email(&payload.email);

        let user = self.users.find_by_email(&email).await?;
        let verified = match &user {
            Some(user) => verify_password(&payload.password, &user.password_hash)?,
            // Unknown emails still pay for one hash check.
            None => {
                verify_password(&payload.password, dummy_hash()?)?;
                false
            }
        };
        let Some(user) = user.filter(|_| verified) else {
            warn!("sign-in rejected");
            return Err(Error::Unauthorized("Invalid email or password".to_string()));
        };

        let session = IssuedSession {
            token: generate_access_token(TOKEN_LENGTH),
            user_id: user.id,
            expires_at: Utc::now() + self.session_ttl,
        };
        self.sessions
            .create(&session.token, session.user_id, session.expires_at)
            .await?;

        info!(user_id = %user.id, "signed in");
        Ok((user, session))
    }

    pub async fn sign_out(&self, token: &str) -> Result<()> {
        self.sessions.delete(token).await
    }

    pub async fn resolve(&self, token: &str) -> Result<Option<SessionUser>> {
        self.resolver.resolve(token).await
    }
}
