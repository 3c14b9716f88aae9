//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

use crate::jobs::DEFAULT_CHECK_SCHEDULE;

const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,

    /// Chat that receives reminders
    pub telegram_chat_id: i64,

    /// Bot API base URL
    pub telegram_api_url: String,

    /// SQLite database file
    pub db_path: String,

    pub web_username: Option<String>,
    pub web_password: Option<String>,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Cron expression for the check pass
    pub check_schedule: String,
}

/// Web login credentials
#[derive(Debug, Clone)]
pub struct WebCredentials {
    pub username: String,
    pub password: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_bot_token =
            var("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::MissingEnv("TELEGRAM_BOT_TOKEN"))?;

        let telegram_chat_id = var("TELEGRAM_CHAT_ID")
            .ok_or(ConfigError::MissingEnv("TELEGRAM_CHAT_ID"))?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TELEGRAM_CHAT_ID"))?;

        let telegram_api_url =
            var("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());

        let db_path = var("DB_PATH").unwrap_or_else(|| "subtrack.db".to_string());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = var("WEB_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("WEB_PORT"))?;

        let check_schedule =
            var("CHECK_SCHEDULE").unwrap_or_else(|| DEFAULT_CHECK_SCHEDULE.to_string());

        Ok(Self {
            telegram_bot_token,
            telegram_chat_id,
            telegram_api_url,
            db_path,
            web_username: var("WEB_USERNAME"),
            web_password: var("WEB_PASSWORD"),
            host,
            port,
            check_schedule,
        })
    }

    /// Web credentials; the service refuses to start without them
    pub fn require_web_credentials(&self) -> Result<WebCredentials, ConfigError> {
        let username = self
            .web_username
            .clone()
            .ok_or(ConfigError::MissingEnv("WEB_USERNAME"))?;
        let password = self
            .web_password
            .clone()
            .ok_or(ConfigError::MissingEnv("WEB_PASSWORD"))?;

        Ok(WebCredentials { username, password })
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
