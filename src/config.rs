//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::str::FromStr;

/// Deployment environment; controls how much error detail reaches clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Movie catalog API key (TMDB v3)
    pub tmdb_api_key: String,
    /// Movie catalog base URL
    pub tmdb_base_url: String,
    /// Upper bound on a single catalog request
    pub tmdb_timeout_secs: u64,
    /// Postgres connection string; `None` selects the in-memory store
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    pub environment: Environment,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET", "must not be empty".into()));
        }

        let environment = match env::var("APP_ENV")
            .unwrap_or_else(|_| "production".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "development" | "dev" => Environment::Development,
            "production" | "prod" => Environment::Production,
            other => {
                return Err(ConfigError::Invalid(
                    "APP_ENV",
                    format!("unknown environment '{}'", other),
                ))
            }
        };

        Ok(Self {
            tmdb_api_key: required("TMDB_API_KEY")?.trim().to_string(),
            tmdb_base_url: env::var("TMDB_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string()),
            tmdb_timeout_secs: parsed("TMDB_TIMEOUT_SECS", 5)?,
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_signing_key: jwt_secret.into_bytes(),
            bcrypt_cost: parsed("BCRYPT_COST", 10)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parsed("PORT", 5000)?,
            environment,
        })
    }

    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            tmdb_api_key: "test_tmdb_key".to_string(),
            tmdb_base_url: "http://127.0.0.1:9/3".to_string(),
            tmdb_timeout_secs: 2,
            database_url: None,
            database_max_connections: 2,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            // bcrypt's minimum cost keeps hashing fast in tests
            bcrypt_cost: 4,
            frontend_url: "http://localhost:5173".to_string(),
            port: 5000,
            environment: Environment::Development,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse '{}'", raw))),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
