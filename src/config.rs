use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_QR_UPSTREAM_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub base_url: String,
    pub admin_user_ids: Vec<String>,
    pub admin_roles: Vec<String>,
    pub enable_seed: bool,
    pub seed_admin_email: String,
    pub seed_admin_password: String,
    pub seed_admin_name: String,
    pub session_cookie_name: String,
    pub session_ttl_hours: i64,
    pub qr_upstream_url: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let session_ttl_hours: i64 = get_env_parse_or("SESSION_TTL_HOURS", 168)?;
        if session_ttl_hours <= 0 {
            return Err(Error::Config(
                "Invalid value for SESSION_TTL_HOURS: must be positive".to_string(),
            ));
        }

        let log_format = match get_env_or("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => {
                return Err(Error::Config(format!(
                    "Invalid value for LOG_FORMAT: {}",
                    other
                )))
            }
        };

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:3000"),
            database_url: get_env("DATABASE_URL")?,
            base_url: get_env_or("BASE_URL", "http://localhost:3000"),
            admin_user_ids: split_list(&get_env_or("ADMIN_USER_IDS", "")),
            admin_roles: split_list(&get_env_or("ADMIN_ROLES", "admin")),
            enable_seed: env::var("ENABLE_SEED").map(|v| v == "1").unwrap_or(false),
            seed_admin_email: get_env_or("SEED_ADMIN_EMAIL", "admin@admin.com"),
            seed_admin_password: get_env_or("SEED_ADMIN_PASSWORD", "12345678"),
            seed_admin_name: get_env_or("SEED_ADMIN_NAME", "Admin"),
            session_cookie_name: get_env_or("SESSION_COOKIE_NAME", "attendance_session"),
            session_ttl_hours,
            qr_upstream_url: get_env_or("QR_UPSTREAM_URL", DEFAULT_QR_UPSTREAM_URL),
            log_format,
        })
    }

    /// Cookies only get the `Secure` attribute when the public origin is https.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Splits a comma-separated value, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}
