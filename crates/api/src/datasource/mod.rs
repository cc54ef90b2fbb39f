//! The market data source the resolvers forward to.
//!
//! Resolvers never touch storage directly: every field goes through
//! [`MarketApi`], so the GraphQL layer can run against Postgres in
//! production and against [`InMemoryMarketApi`] in tests and demos.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use infra::models::{
    BetRow, LeaderboardRow, LiquidityEventRow, MarketRow, OracleRow, Outcome, TradeRow, UserRow,
};
use infra::pagination::Keyset;
use infra::repos::{LeaderboardPeriod, MarketFilter};

use crate::auth::AuthUser;

pub use memory::InMemoryMarketApi;
pub use postgres::PgMarketApi;

/// Seeded by the initial migration and by the in-memory store.
pub const MANUAL_ORACLE_ID: Uuid = Uuid::from_u128(1);

pub type DataResult<T> = Result<T, DataSourceError>;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Invalid(String),

    #[error("market {0} is closed for trading")]
    Closed(Uuid),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl DataSourceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DataSourceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaceBet {
    pub market_id: Uuid,
    pub outcome: Outcome,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct NewMarket {
    pub question: String,
    pub oracle_id: Uuid,
    pub resolution: Option<DateTime<Utc>>,
    pub initial_probability: f64,
    pub initial_liquidity: i64,
}

/// Everything a successful bet produced.
#[derive(Debug, Clone)]
pub struct BetReceipt {
    pub bet: BetRow,
    pub trade: TradeRow,
    pub market: MarketRow,
}

#[derive(Debug, Clone)]
pub struct LiquidityReceipt {
    pub event: LiquidityEventRow,
    pub market: MarketRow,
}

#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Cheap round-trip proving the backend is reachable.
    async fn health(&self) -> DataResult<()>;

    async fn get_market(&self, id: Uuid) -> DataResult<Option<MarketRow>>;

    async fn list_markets(&self, filter: &MarketFilter, limit: i64) -> DataResult<Vec<MarketRow>>;

    async fn create_market(&self, input: NewMarket, creator: &AuthUser) -> DataResult<MarketRow>;

    async fn place_bet(&self, input: PlaceBet, user: &AuthUser) -> DataResult<BetReceipt>;

    async fn add_liquidity(
        &self,
        market_id: Uuid,
        amount: i64,
        provider: &AuthUser,
    ) -> DataResult<LiquidityReceipt>;

    async fn bets_for_market(&self, market_id: Uuid) -> DataResult<Vec<BetRow>>;

    /// Newest-first trades strictly after `after`, at most `limit` rows.
    async fn trades_for_market(
        &self,
        market_id: Uuid,
        after: Option<Keyset>,
        limit: i64,
    ) -> DataResult<Vec<TradeRow>>;

    async fn list_oracles(&self) -> DataResult<Vec<OracleRow>>;

    async fn oracles_by_ids(&self, ids: &[Uuid]) -> DataResult<Vec<OracleRow>>;

    async fn users_by_ids(&self, ids: &[Uuid]) -> DataResult<Vec<UserRow>>;

    async fn user_by_address(&self, address: &str) -> DataResult<Option<UserRow>>;

    async fn leaderboard(
        &self,
        period: LeaderboardPeriod,
        limit: i64,
    ) -> DataResult<Vec<LeaderboardRow>>;
}

pub(crate) fn validate_bet(input: &PlaceBet) -> DataResult<()> {
    if input.amount <= 0 {
        return Err(DataSourceError::Invalid(
            "Bet amount must be positive".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_liquidity(amount: i64) -> DataResult<()> {
    if amount <= 0 {
        return Err(DataSourceError::Invalid(
            "Liquidity amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Add `amount` to a market counter, refusing totals past `i64::MAX`.
pub(crate) fn checked_total(current: i64, amount: i64, counter: &str) -> DataResult<i64> {
    current
        .checked_add(amount)
        .ok_or_else(|| DataSourceError::Invalid(format!("Market {counter} overflow")))
}

/// Check a market definition and return it with the question trimmed.
pub(crate) fn validate_new_market(mut input: NewMarket) -> DataResult<NewMarket> {
    input.question = input.question.trim().to_string();
    if input.question.is_empty() {
        return Err(DataSourceError::Invalid(
            "Market question must not be empty".to_string(),
        ));
    }
    // Also rejects NaN
    if !(input.initial_probability > 0.0 && input.initial_probability < 1.0) {
        return Err(DataSourceError::Invalid(
            "Initial probability must lie strictly between 0 and 1".to_string(),
        ));
    }
    if input.initial_liquidity < 0 {
        return Err(DataSourceError::Invalid(
            "Initial liquidity must not be negative".to_string(),
        ));
    }
    Ok(input)
}
