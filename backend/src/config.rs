use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be a number")]
    InvalidNumber(&'static str),
    #[error("DEFAULT_TIMEZONE '{0}' is not a known IANA timezone")]
    InvalidTimezone(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    /// Used for households without a stored timezone.
    pub default_timezone: String,
    pub cors_origins: Vec<String>,
    pub max_connections: u32,
}

fn parse_number<T: std::str::FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(key))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_timezone = env::var("DEFAULT_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        if default_timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::InvalidTimezone(default_timezone));
        }

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_number("PORT", "8080")?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:chores.db?mode=rwc".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "development-secret-key-change-in-production".to_string()),
            default_timezone,
            cors_origins,
            max_connections: parse_number("DATABASE_MAX_CONNECTIONS", "5")?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            default_timezone: "UTC".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            max_connections: 1,
        }
    }
}
