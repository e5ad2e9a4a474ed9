pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::database::{
    PgQrCodeStore, PgSessionStore, PgUserStore, QrCodeStore, SessionResolver, SessionStore,
    UserStore,
};
use crate::error::Result;
use crate::middleware::auth::AdminPolicy;
use crate::services::{
    auth_service::AuthService, qr_image_service::QrImageService, qrcode_service::QrCodeService,
    user_service::UserService,
};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub admin_policy: Arc<AdminPolicy>,
    pub qrcode_service: QrCodeService,
    pub user_service: UserService,
    pub auth_service: AuthService,
    pub qr_image_service: QrImageService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self> {
        Self::with_stores(
            config,
            Arc::new(PgQrCodeStore::new(pool.clone())),
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgSessionStore::new(pool)),
        )
    }

    /// Wires services over any store implementation, e.g. `MemoryStore` in tests.
    pub fn with_stores<S>(
        config: Config,
        qrcodes: Arc<dyn QrCodeStore>,
        users: Arc<dyn UserStore>,
        sessions: Arc<S>,
    ) -> Result<Self>
    where
        S: SessionStore + SessionResolver + 'static,
    {
        let http_client = Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;

        let session_store: Arc<dyn SessionStore> = sessions.clone();
        let resolver: Arc<dyn SessionResolver> = sessions;

        let qr_image_service = QrImageService::new(&config.qr_upstream_url, http_client)?;
        let auth_service = AuthService::new(
            users.clone(),
            session_store,
            resolver,
            config.session_ttl_hours,
        );

        Ok(Self {
            admin_policy: Arc::new(AdminPolicy::from_config(&config)),
            qrcode_service: QrCodeService::new(qrcodes),
            user_service: UserService::new(users),
            auth_service,
            qr_image_service,
            config: Arc::new(config),
        })
    }
}
