use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;

use crate::auth::AuthConfig;

/// Which market data source backs the resolvers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
        skip_migrations: bool,
    },
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetRateLimitConfig {
    pub per_minute: u32,
    pub burst: u32,
}

impl Default for BetRateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 30,
            burst: 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpRateLimitConfig {
    /// One request token is replenished every `replenish_ms` milliseconds.
    pub replenish_ms: u64,
    pub burst: u32,
}

impl Default for HttpRateLimitConfig {
    fn default() -> Self {
        Self {
            replenish_ms: 100,
            burst: 60,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub backend: BackendConfig,
    pub allowed_origins: Vec<String>,
    pub introspection: bool,
    pub request_timeout_secs: u64,
    pub bet_rate_limit: BetRateLimitConfig,
    pub http_rate_limit: HttpRateLimitConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let backend = match env::var("MARKET_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => BackendConfig::Postgres {
                database_url: env::var("DATABASE_URL")
                    .context("DATABASE_URL must be set when MARKET_BACKEND=postgres")?,
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 30)?,
                skip_migrations: parse_or("SKIP_MIGRATIONS", false)?,
            },
            "memory" => BackendConfig::Memory,
            other => bail!("unknown MARKET_BACKEND '{other}', expected 'postgres' or 'memory'"),
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            port: parse_or("PORT", 4000)?,
            backend,
            allowed_origins,
            introspection: parse_or("GQL_INTROSPECTION", false)?,
            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 30)?,
            bet_rate_limit: BetRateLimitConfig {
                per_minute: parse_or("BET_RATE_LIMIT_PER_MINUTE", 30)?,
                burst: parse_or("BET_RATE_LIMIT_BURST", 5)?,
            },
            http_rate_limit: HttpRateLimitConfig {
                replenish_ms: parse_or("HTTP_RATE_LIMIT_REPLENISH_MS", 100)?,
                burst: parse_or("HTTP_RATE_LIMIT_BURST", 60)?,
            },
            auth: AuthConfig::from_env()?,
        })
    }

    /// In-memory configuration with defaults, used by tests and local demos.
    pub fn in_memory(auth: AuthConfig) -> Self {
        Self {
            port: 4000,
            backend: BackendConfig::Memory,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            introspection: true,
            request_timeout_secs: 30,
            bet_rate_limit: BetRateLimitConfig::default(),
            http_rate_limit: HttpRateLimitConfig::default(),
            auth,
        }
    }
}

/// Read `key` from the environment, falling back to `default` when unset.
/// A value that is set but does not parse is an error.
pub(crate) fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .to_lowercase()
            .parse()
            .with_context(|| format!("{key} has invalid value '{raw}'")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e).with_context(|| format!("{key} is not valid unicode")),
    }
}
