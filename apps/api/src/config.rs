use anyhow::{bail, Context, Result};

use crate::comparison::diff::DEFAULT_MAX_LINES;
use crate::comparison::service::OwnershipPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    /// Maximum number of classified lines returned in a text diff.
    pub diff_line_limit: usize,
    pub history_default_limit: i64,
    pub compare_ownership: OwnershipPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            diff_line_limit: positive_env("DIFF_LINE_LIMIT", DEFAULT_MAX_LINES)?,
            history_default_limit: positive_env("HISTORY_DEFAULT_LIMIT", 10)?,
            compare_ownership: std::env::var("COMPARE_OWNERSHIP")
                .unwrap_or_else(|_| "unrestricted".to_string())
                .parse()?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn positive_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    let value = match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} must be an integer, got '{raw}'"))?,
        Err(_) => return Ok(default),
    };
    if value < T::from(1) {
        bail!("{key} must be at least 1");
    }
    Ok(value)
}
