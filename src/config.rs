//! Application configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

/// 5 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub io_timeout: Duration,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<String>,
    pub admin: Option<AdminSeed>,
}

/// Credentials for the first admin account, created when the users table is empty.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: AdminPassword,
}

#[derive(Debug, Clone)]
pub enum AdminPassword {
    Plain(String),
    Hashed(String),
}

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            environment: "development".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl_hours: 24,
            upload_dir: PathBuf::from("public/uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            io_timeout: Duration::from_secs(10),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // ALLOWED_ORIGINS (comma-separated) wins over FRONTEND_ORIGIN.
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| std::env::var("FRONTEND_ORIGIN").ok().map(|o| vec![o]))
            .unwrap_or(defaults.allowed_origins);

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            session_ttl_hours: env_or("SESSION_TTL_HOURS", defaults.session_ttl_hours),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            io_timeout: Duration::from_secs(env_or("IO_TIMEOUT_SECS", 10)),
            bcrypt_cost: env_or("BCRYPT_COST", defaults.bcrypt_cost),
            allowed_origins,
            admin: admin_seed_from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Request bodies may carry one upload plus form overhead.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes * 2
    }
}

fn admin_seed_from_env() -> Option<AdminSeed> {
    let email = std::env::var("ADMIN_EMAIL").ok().filter(|e| !e.is_empty())?;
    let password = if let Ok(hash) = std::env::var("ADMIN_HASH_PASSWORD") {
        AdminPassword::Hashed(hash)
    } else {
        AdminPassword::Plain(std::env::var("ADMIN_PASSWORD").ok()?)
    };

    Some(AdminSeed {
        name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
        email,
        password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_usable() {
        let config = AppConfig::default();
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.body_limit() > config.max_upload_bytes);
        assert!(!config.is_production());
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_from_env_falls_back_to_defaults() {
        let config = AppConfig::from_env();
        assert!(config.port > 0);
        assert!(config.io_timeout.as_secs() >= 1);
        assert!(!config.allowed_origins.is_empty());
    }
}
