use std::time::Duration;

use async_graphql::ErrorExtensions;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::datasource::DataSourceError;
use crate::rate_limit::RateLimited;

/// Unified error type for GraphQL resolvers.
///
/// Every variant maps to a stable `extensions.code` so clients can branch
/// without parsing messages. Use `.extend()` (or `GqlResultExt::extended`)
/// to turn one into an `async_graphql::Error` carrying that code.
#[derive(Debug)]
pub enum GqlError {
    DataSource(DataSourceError),
    Uuid(uuid::Error),
    RateLimited { retry_after: Duration },
    Unauthenticated,
    Forbidden(String),
    /// A subscriber fell more than a channel's capacity behind.
    Lagged { skipped: u64 },
    Custom(String),
}

impl GqlError {
    pub fn new(msg: impl Into<String>) -> Self {
        GqlError::Custom(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            GqlError::DataSource(DataSourceError::NotFound { .. }) => "NOT_FOUND",
            GqlError::DataSource(DataSourceError::Invalid(_)) => "BAD_USER_INPUT",
            GqlError::DataSource(DataSourceError::Closed(_)) => "MARKET_CLOSED",
            GqlError::DataSource(DataSourceError::Database(_)) => "INTERNAL",
            GqlError::Uuid(_) | GqlError::Custom(_) => "BAD_USER_INPUT",
            GqlError::RateLimited { .. } => "RATE_LIMITED",
            GqlError::Unauthenticated => "UNAUTHENTICATED",
            GqlError::Forbidden(_) => "FORBIDDEN",
            GqlError::Lagged { .. } => "LAGGED",
        }
    }
}

impl std::fmt::Display for GqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GqlError::DataSource(DataSourceError::Database(e)) => {
                // Log the real error server-side; return a generic message to clients
                tracing::error!("Database error: {e}");
                write!(f, "Internal database error")
            }
            GqlError::DataSource(e) => write!(f, "{e}"),
            GqlError::Uuid(e) => write!(f, "Invalid ID: {e}"),
            GqlError::RateLimited { retry_after } => write!(
                f,
                "Rate limit exceeded, retry in {}ms",
                retry_after.as_millis()
            ),
            GqlError::Unauthenticated => write!(f, "You must be logged in to perform this action"),
            GqlError::Forbidden(msg) => write!(f, "Access denied: {msg}"),
            GqlError::Lagged { skipped } => {
                write!(f, "Subscriber fell behind, {skipped} events were dropped")
            }
            GqlError::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for GqlError {}

impl ErrorExtensions for GqlError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            match self {
                GqlError::RateLimited { retry_after } => {
                    e.set("retryAfterMs", retry_after.as_millis() as u64);
                }
                GqlError::Lagged { skipped } => e.set("skipped", *skipped),
                _ => {}
            }
        })
    }
}

impl From<DataSourceError> for GqlError {
    fn from(e: DataSourceError) -> Self {
        GqlError::DataSource(e)
    }
}

impl From<uuid::Error> for GqlError {
    fn from(e: uuid::Error) -> Self {
        GqlError::Uuid(e)
    }
}

impl From<BroadcastStreamRecvError> for GqlError {
    fn from(e: BroadcastStreamRecvError) -> Self {
        match e {
            BroadcastStreamRecvError::Lagged(skipped) => GqlError::Lagged { skipped },
        }
    }
}

impl From<RateLimited> for GqlError {
    fn from(e: RateLimited) -> Self {
        GqlError::RateLimited {
            retry_after: e.retry_after,
        }
    }
}

/// Extension trait that converts any `Result<T, E>` where `E: Display`
/// into `async_graphql::Result<T>` with a contextual message prefix.
///
/// Usage: `Uuid::parse_str(id).gql_err("Invalid market ID")?`
pub trait ResultExt<T> {
    fn gql_err(self, context: &str) -> std::result::Result<T, async_graphql::Error>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn gql_err(self, context: &str) -> std::result::Result<T, async_graphql::Error> {
        self.map_err(|e| async_graphql::Error::new(format!("{context}: {e}")))
    }
}

/// Converts results whose error maps onto `GqlError`, keeping its code.
///
/// Usage: `state.market_api().get_market(id).await.extended()?`
pub trait GqlResultExt<T> {
    fn extended(self) -> std::result::Result<T, async_graphql::Error>;
}

impl<T, E: Into<GqlError>> GqlResultExt<T> for std::result::Result<T, E> {
    fn extended(self) -> std::result::Result<T, async_graphql::Error> {
        self.map_err(|e| {
            let err: GqlError = e.into();
            err.extend()
        })
    }
}
