#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use attendance_backend::{
    config::{Config, LogFormat, DEFAULT_QR_UPSTREAM_URL},
    database::{MemoryStore, SessionResolver, SessionStore},
    dto::{auth_dto::SignInPayload, user_dto::CreateUserPayload},
    error::{Error, Result},
    models::{session::SessionUser, user::User},
    routes, AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "attendance_session";
pub const PASSWORD: &str = "panitia-rahasia";

pub fn test_config(qr_upstream_url: &str) -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        database_url: "postgres://unused".to_string(),
        base_url: "http://localhost:3000".to_string(),
        admin_user_ids: Vec::new(),
        admin_roles: vec!["admin".to_string()],
        enable_seed: false,
        seed_admin_email: "admin@admin.com".to_string(),
        seed_admin_password: "12345678".to_string(),
        seed_admin_name: "Admin".to_string(),
        session_cookie_name: COOKIE_NAME.to_string(),
        session_ttl_hours: 168,
        qr_upstream_url: qr_upstream_url.to_string(),
        log_format: LogFormat::Pretty,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(DEFAULT_QR_UPSTREAM_URL))
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_stores(config, store.clone(), store.clone(), store)
            .expect("app state");
        Self {
            router: routes::router(state.clone()),
            state,
        }
    }

    /// Creates an account with `role` and returns it with a ready `Cookie` header value.
    pub async fn signed_in(&self, email: &str, role: Option<&str>) -> (User, String) {
        self.state
            .user_service
            .create(
                CreateUserPayload {
                    email: Some(email.to_string()),
                    password: Some(PASSWORD.to_string()),
                    name: Some("Panitia".to_string()),
                },
                role,
            )
            .await
            .expect("create user");
        let (user, session) = self
            .state
            .auth_service
            .sign_in(SignInPayload {
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("sign in");
        (user, format!("{}={}", COOKIE_NAME, session.token))
    }

    pub async fn admin(&self) -> (User, String) {
        self.signed_in("admin@example.com", Some("admin")).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, HeaderMap, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let resp = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), 4 * 1024 * 1024).await.unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, headers, json)
    }
}

/// Session backend that is always down.
pub struct UnavailableSessions;

#[async_trait]
impl SessionResolver for UnavailableSessions {
    async fn resolve(&self, _token: &str) -> Result<Option<SessionUser>> {
        Err(Error::Internal("connection refused".to_string()))
    }
}

#[async_trait]
impl SessionStore for UnavailableSessions {
    async fn create(&self, _token: &str, _user_id: Uuid, _expires_at: DateTime<Utc>) -> Result<()> {
        Err(Error::Internal("connection refused".to_string()))
    }

    async fn delete(&self, _token: &str) -> Result<()> {
        Err(Error::Internal("connection refused".to_string()))
    }
}
