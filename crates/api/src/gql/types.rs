use async_graphql::connection::{Connection, CursorType, Edge};
use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, Enum, Result, SimpleObject, ID};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use infra::models::{BetRow, MarketRow, OracleRow, TradeRow, UserRow};
use infra::pagination::{page_size, Keyset};

use crate::gql::error::{GqlResultExt, ResultExt};
use crate::gql::loaders::{OracleLoader, UserLoader};
use crate::gql::scalars::BigInt;
use crate::state::AppState;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Yes,
    No,
}

impl From<infra::models::Outcome> for Outcome {
    fn from(outcome: infra::models::Outcome) -> Self {
        match outcome {
            infra::models::Outcome::Yes => Outcome::Yes,
            infra::models::Outcome::No => Outcome::No,
        }
    }
}

impl From<Outcome> for infra::models::Outcome {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Yes => infra::models::Outcome::Yes,
            Outcome::No => infra::models::Outcome::No,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum MarketStatus {
    /// Accepting bets.
    Open,
    /// Past its resolution time.
    Closed,
}

impl From<MarketStatus> for infra::repos::MarketState {
    fn from(status: MarketStatus) -> Self {
        match status {
            MarketStatus::Open => infra::repos::MarketState::Open,
            MarketStatus::Closed => infra::repos::MarketState::Closed,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct User {
    pub id: ID,
    pub address: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    /// 1-based position; only set on leaderboard results.
    pub rank: Option<i32>,
    /// Bet volume inside the requested period; only set on leaderboard results.
    pub period_volume: Option<BigInt>,
    /// Bets placed inside the requested period; only set on leaderboard results.
    pub bet_count: Option<i32>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id.into(),
            address: row.address,
            display_name: row.display_name,
            created_at: row.created_at,
            rank: None,
            period_volume: None,
            bet_count: None,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct Oracle {
    pub id: ID,
    pub name: String,
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
}

impl From<OracleRow> for Oracle {
    fn from(row: OracleRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            endpoint: row.endpoint,
            created_at: row.created_at,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Market {
    pub id: ID,
    pub question: String,
    pub probability: f64,
    pub volume: BigInt,
    pub liquidity: BigInt,
    pub resolution: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub market_id: Uuid,
    #[graphql(skip)]
    pub oracle_id: Uuid,
}

impl From<MarketRow> for Market {
    fn from(row: MarketRow) -> Self {
        Self {
            id: row.id.into(),
            question: row.question,
            probability: row.probability,
            volume: BigInt(row.volume),
            liquidity: BigInt(row.liquidity),
            resolution: row.resolution,
            created_at: row.created_at,
            market_id: row.id,
            oracle_id: row.oracle_id,
        }
    }
}

#[ComplexObject]
impl Market {
    /// Price of the YES side; equal to `probability`.
    async fn yes_price(&self) -> f64 {
        self.probability
    }

    /// Price of the NO side; `1 - probability`.
    async fn no_price(&self) -> f64 {
        1.0 - self.probability
    }

    async fn status(&self) -> MarketStatus {
        match self.resolution {
            Some(resolution) if resolution <= Utc::now() => MarketStatus::Closed,
            _ => MarketStatus::Open,
        }
    }

    async fn oracle(&self, ctx: &Context<'_>) -> Result<Oracle> {
        let loader = ctx.data::<DataLoader<OracleLoader>>()?;

        loader
            .load_one(self.oracle_id)
            .await
            .gql_err("Loading oracle failed")?
            .map(Oracle::from)
            .ok_or_else(|| async_graphql::Error::new(format!("Oracle {} not found", self.oracle_id)))
    }

    async fn bets(&self, ctx: &Context<'_>) -> Result<Vec<Bet>> {
        let state = ctx.data::<AppState>()?;
        let rows = state
            .market_api()
            .bets_for_market(self.market_id)
            .await
            .extended()?;
        Ok(rows.into_iter().map(Bet::from).collect())
    }

    /// Trades on this market, newest first.
    async fn trades(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<Connection<TradeCursor, Trade>> {
        let state = ctx.data::<AppState>()?;

        let after = after
            .as_deref()
            .map(TradeCursor::decode_cursor)
            .transpose()
            .gql_err("Invalid cursor")?;
        let limit = page_size(first);

        // One extra row tells us whether another page exists
        let mut rows = state
            .market_api()
            .trades_for_market(self.market_id, after.map(|c| c.0), limit + 1)
            .await
            .extended()?;

        let has_next_page = rows.len() as i64 > limit;
        rows.truncate(limit as usize);

        let mut connection = Connection::new(after.is_some(), has_next_page);
        connection.edges.extend(rows.into_iter().map(|row| {
            Edge::new(
                TradeCursor(Keyset::new(row.created_at, row.id)),
                Trade::from(row),
            )
        }));

        Ok(connection)
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Bet {
    pub id: ID,
    pub market_id: ID,
    pub outcome: Outcome,
    pub amount: BigInt,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub user_id: Uuid,
}

impl From<BetRow> for Bet {
    fn from(row: BetRow) -> Self {
        Self {
            id: row.id.into(),
            market_id: row.market_id.into(),
            outcome: row.outcome.into(),
            amount: BigInt(row.amount),
            price: row.price,
            created_at: row.created_at,
            user_id: row.user_id,
        }
    }
}

#[ComplexObject]
impl Bet {
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loader = ctx.data::<DataLoader<UserLoader>>()?;
        Ok(loader
            .load_one(self.user_id)
            .await
            .gql_err("Loading user failed")?
            .map(User::from))
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Trade {
    pub id: ID,
    pub market_id: ID,
    pub trader_id: ID,
    pub outcome: Outcome,
    pub amount: BigInt,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub market_uuid: Uuid,
    #[graphql(skip)]
    pub trader_uuid: Uuid,
}

impl From<TradeRow> for Trade {
    fn from(row: TradeRow) -> Self {
        Self {
            id: row.id.into(),
            market_id: row.market_id.into(),
            trader_id: row.trader_id.into(),
            outcome: row.outcome.into(),
            amount: BigInt(row.amount),
            price: row.price,
            created_at: row.created_at,
            market_uuid: row.market_id,
            trader_uuid: row.trader_id,
        }
    }
}

#[ComplexObject]
impl Trade {
    async fn trader(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let loader = ctx.data::<DataLoader<UserLoader>>()?;
        Ok(loader
            .load_one(self.trader_uuid)
            .await
            .gql_err("Loading trader failed")?
            .map(User::from))
    }
}

/// Price tick emitted whenever a trade executes on a market.
#[derive(SimpleObject, Clone, Debug)]
pub struct PriceUpdate {
    pub market_id: ID,
    pub probability: f64,
    pub yes_price: f64,
    pub no_price: f64,
    pub volume: BigInt,
    pub liquidity: BigInt,
    pub timestamp: DateTime<Utc>,
}

impl PriceUpdate {
    pub fn from_market(market: &MarketRow, timestamp: DateTime<Utc>) -> Self {
        Self {
            market_id: market.id.into(),
            probability: market.probability,
            yes_price: market.probability,
            no_price: 1.0 - market.probability,
            volume: BigInt(market.volume),
            liquidity: BigInt(market.liquidity),
            timestamp,
        }
    }
}

#[derive(Debug, Error)]
#[error("malformed trade cursor")]
pub struct InvalidCursor;

/// Opaque cursor over the `(created_at, id)` ordering of trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeCursor(pub Keyset);

impl CursorType for TradeCursor {
    type Error = InvalidCursor;

    fn decode_cursor(s: &str) -> std::result::Result<Self, Self::Error> {
        let bytes = URL_SAFE_NO_PAD.decode(s).map_err(|_| InvalidCursor)?;
        let text = String::from_utf8(bytes).map_err(|_| InvalidCursor)?;
        let (micros, id) = text.split_once(':').ok_or(InvalidCursor)?;

        let micros: i64 = micros.parse().map_err(|_| InvalidCursor)?;
        let created_at = DateTime::<Utc>::from_timestamp_micros(micros).ok_or(InvalidCursor)?;
        let id = Uuid::parse_str(id).map_err(|_| InvalidCursor)?;

        Ok(TradeCursor(Keyset::new(created_at, id)))
    }

    fn encode_cursor(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!(
            "{}:{}",
            self.0.created_at.timestamp_micros(),
            self.0.id
        ))
    }
}
