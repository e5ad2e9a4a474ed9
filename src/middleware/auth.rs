use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::config::Config;
use crate::database::SessionResolver;
use crate::error::{Error, Result};
use crate::models::session::SessionUser;
use crate::AppState;

/// Who counts as an administrator: anyone holding one of `roles`, or whose id
/// is listed in `user_ids`.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    user_ids: Vec<String>,
    roles: Vec<String>,
}

impl AdminPolicy {
    pub fn new(user_ids: Vec<String>, roles: Vec<String>) -> Self {
        Self { user_ids, roles }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.admin_user_ids.clone(), config.admin_roles.clone())
    }

    pub fn is_admin(&self, user: &SessionUser) -> bool {
        let has_role = user
            .roles()
            .iter()
            .any(|r| self.roles.iter().any(|allowed| allowed == r));
        let id = user.user_id.to_string();
        has_role || self.user_ids.iter().any(|allowed| allowed.eq_ignore_ascii_case(&id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any signed-in user.
    Session,
    /// Signed-in user that passes the [`AdminPolicy`].
    Admin,
}

/// The guard every protected route runs through.
///
/// No token → 401, unknown or expired session → 401, resolver failure → 503,
/// authenticated but not allowed → 403.
pub async fn authorize(
    resolver: &dyn SessionResolver,
    policy: &AdminPolicy,
    token: Option<&str>,
    access: Access,
) -> Result<SessionUser> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Unauthorized("Unauthorized".to_string()))?;

    let user = match resolver.resolve(token).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(Error::Unauthorized("Invalid session".to_string())),
        Err(e) => {
            warn!(error = %e, "session backend unavailable");
            return Err(Error::ServiceUnavailable(format!("Auth unavailable: {}", e)));
        }
    };

    if access == Access::Admin && !policy.is_admin(&user) {
        return Err(Error::Forbidden("Forbidden".to_string()));
    }
    Ok(user)
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    guard(state, req, next, Access::Admin).await
}

pub async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    guard(state, req, next, Access::Session).await
}

async fn guard(state: AppState, mut req: Request, next: Next, access: Access) -> Response {
    // Preflights never carry cookies.
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }
    let token = session_token(req.headers(), &state.config.session_cookie_name);
    match authorize(
        state.auth_service.resolver(),
        &state.admin_policy,
        token.as_deref(),
        access,
    )
    .await
    {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

/// Finds `name` across all `Cookie` headers.
pub fn session_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}
