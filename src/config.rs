//! Application configuration loaded from environment variables.
//!
//! Everything has a sane local-dev default so the service starts with an
//! empty environment; production deployments override via env vars or a
//! `.env` file.

use std::env;

/// Avito site origin. Overridable via `BASE_URL` so tests can point the
/// fetch layer at a mock server.
pub const DEFAULT_BASE_URL: &str = "https://www.avito.ru";

/// City path segment used in all search and catalog URLs.
pub const CITY: &str = "yoshkar-ola";

/// Search categories scanned in phase 1: (name, Avito category slug).
pub const SEARCH_CATEGORIES: &[(&str, &str)] = &[
    ("sale", "prodam-ASgBAgICAUSSA8YQ"),
    ("rent", "sdam-ASgBAgICAUSSA8gQ"),
];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Database ---
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,

    // --- Server ---
    /// HTTP listen port
    pub port: u16,

    // --- Scanner ---
    /// Seconds to sleep between search/listing page fetches
    pub scan_delay_search: f64,
    /// Seconds to sleep between house catalog page fetches
    pub scan_delay_house: f64,
    /// Consecutive fetch failures before a scan phase gives up
    pub max_consecutive_errors: u32,

    // --- Fetch layer ---
    /// Avito origin (override for tests)
    pub base_url: String,
    /// Browser user-agent sent with every request
    pub user_agent: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_name: "postgres".to_string(),
            db_user: "postgres".to_string(),
            db_password: String::new(),
            port: 8000,
            scan_delay_search: 0.0,
            scan_delay_house: 0.0,
            max_consecutive_errors: 5,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored when present (local development).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            db_host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            db_port: parse_var("DB_PORT", 5432)?,
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "postgres".to_string()),
            db_user: env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            db_password: env::var("DB_PASSWORD").unwrap_or_default(),

            port: parse_var("PORT", 8000)?,

            scan_delay_search: parse_var("SCAN_DELAY_SEARCH", 4.0)?,
            scan_delay_house: parse_var("SCAN_DELAY_HOUSE", 6.0)?,
            max_consecutive_errors: parse_var("MAX_CONSECUTIVE_ERRORS", 5)?,

            base_url: env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            user_agent: env::var("USER_AGENT")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        })
    }

    /// Postgres connection URL for sqlx.
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

/// Parse an env var, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
