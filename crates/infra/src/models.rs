use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Side of a binary market a bet is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bet_outcome", rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OracleRow {
    pub id: Uuid,
    pub name: String,
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MarketRow {
    pub id: Uuid,
    pub question: String,
    pub probability: f64,
    pub volume: i64,
    pub liquidity: i64,
    pub resolution: Option<DateTime<Utc>>,
    pub oracle_id: Uuid,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MarketRow {
    /// A market accepts bets until its resolution time passes.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        match self.resolution {
            Some(resolution) => resolution > now,
            None => true,
        }
    }

    /// Price paid per unit for the given side at the current probability.
    pub fn price_for(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Yes => self.probability,
            Outcome::No => 1.0 - self.probability,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub address: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BetRow {
    pub id: Uuid,
    pub market_id: Uuid,
    pub user_id: Uuid,
    pub outcome: Outcome,
    pub amount: i64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TradeRow {
    pub id: Uuid,
    pub market_id: Uuid,
    pub bet_id: Uuid,
    pub trader_id: Uuid,
    pub outcome: Outcome,
    pub amount: i64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LiquidityEventRow {
    pub id: Uuid,
    pub market_id: Uuid,
    pub provider_id: Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// One leaderboard line: a user plus their betting activity in the period.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub address: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub volume: i64,
    pub bet_count: i64,
}
