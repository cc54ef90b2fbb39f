use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use infra::db::Db;
use infra::models::{BetRow, LeaderboardRow, MarketRow, OracleRow, TradeRow, UserRow};
use infra::pagination::Keyset;
use infra::repos::{
    bets, leaderboard, liquidity, markets, oracles, trades, users, CreateBet, CreateMarket,
    LeaderboardPeriod, MarketFilter,
};

use super::{
    checked_total, validate_bet, validate_liquidity, validate_new_market, BetReceipt, DataResult,
    DataSourceError, LiquidityReceipt, MarketApi, NewMarket, PlaceBet,
};
use crate::auth::AuthUser;

/// Market data source backed by the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgMarketApi {
    db: Db,
}

impl PgMarketApi {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

/// Surface a duplicate address as a client error rather than a database fault.
fn address_conflict(err: sqlx::Error, address: &str) -> DataSourceError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DataSourceError::Invalid(
            format!("Address {address} is already registered to another user"),
        ),
        _ => DataSourceError::Database(err),
    }
}

#[async_trait]
impl MarketApi for PgMarketApi {
    async fn health(&self) -> DataResult<()> {
        let _one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.db).await?;
        Ok(())
    }

    async fn get_market(&self, id: Uuid) -> DataResult<Option<MarketRow>> {
        Ok(markets::get_by_id(&self.db, id).await?)
    }

    async fn list_markets(&self, filter: &MarketFilter, limit: i64) -> DataResult<Vec<MarketRow>> {
        Ok(markets::list(&self.db, filter, Utc::now(), limit).await?)
    }

    async fn create_market(&self, input: NewMarket, creator: &AuthUser) -> DataResult<MarketRow> {
        let input = validate_new_market(input)?;

        let mut tx = self.db.begin().await?;

        if oracles::get_by_id(&mut *tx, input.oracle_id).await?.is_none() {
            return Err(DataSourceError::not_found("oracle", input.oracle_id));
        }

        let creator_row = users::ensure(&mut *tx, creator.id, &creator.address)
            .await
            .map_err(|e| address_conflict(e, &creator.address))?;

        let market = markets::create(
            &mut *tx,
            CreateMarket {
                question: input.question,
                probability: input.initial_probability,
                liquidity: input.initial_liquidity,
                resolution: input.resolution,
                oracle_id: input.oracle_id,
                created_by: Some(creator_row.id),
            },
        )
        .await?;

        tx.commit().await?;

        info!(market_id = %market.id, creator = %creator.id, "Market created");
        Ok(market)
    }

    async fn place_bet(&self, input: PlaceBet, user: &AuthUser) -> DataResult<BetReceipt> {
        validate_bet(&input)?;

        let mut tx = self.db.begin().await?;

        // Row lock serializes concurrent bets on the same market
        let market = markets::get_by_id_for_update(&mut *tx, input.market_id)
            .await?
            .ok_or_else(|| DataSourceError::not_found("market", input.market_id))?;

        if !market.is_open_at(Utc::now()) {
            return Err(DataSourceError::Closed(market.id));
        }
        checked_total(market.volume, input.amount, "volume")?;

        let trader = users::ensure(&mut *tx, user.id, &user.address)
            .await
            .map_err(|e| address_conflict(e, &user.address))?;

        let bet = bets::create(
            &mut *tx,
            CreateBet {
                market_id: market.id,
                user_id: trader.id,
                outcome: input.outcome,
                amount: input.amount,
                price: market.price_for(input.outcome),
            },
        )
        .await?;

        let trade = trades::create_for_bet(&mut *tx, &bet).await?;
        let market = markets::add_volume(&mut *tx, market.id, bet.amount).await?;

        tx.commit().await?;

        Ok(BetReceipt { bet, trade, market })
    }

    async fn add_liquidity(
        &self,
        market_id: Uuid,
        amount: i64,
        provider: &AuthUser,
    ) -> DataResult<LiquidityReceipt> {
        validate_liquidity(amount)?;

        let mut tx = self.db.begin().await?;

        let market = markets::get_by_id_for_update(&mut *tx, market_id)
            .await?
            .ok_or_else(|| DataSourceError::not_found("market", market_id))?;
        checked_total(market.liquidity, amount, "liquidity")?;

        let market = markets::add_liquidity(&mut *tx, market.id, amount).await?;

        let provider_row = users::ensure(&mut *tx, provider.id, &provider.address)
            .await
            .map_err(|e| address_conflict(e, &provider.address))?;

        let event = liquidity::record(&mut *tx, market.id, provider_row.id, amount).await?;

        tx.commit().await?;

        Ok(LiquidityReceipt { event, market })
    }

    async fn bets_for_market(&self, market_id: Uuid) -> DataResult<Vec<BetRow>> {
        Ok(bets::list_by_market(&self.db, market_id).await?)
    }

    async fn trades_for_market(
        &self,
        market_id: Uuid,
        after: Option<Keyset>,
        limit: i64,
    ) -> DataResult<Vec<TradeRow>> {
        Ok(trades::list_by_market(&self.db, market_id, after, limit).await?)
    }

    async fn list_oracles(&self) -> DataResult<Vec<OracleRow>> {
        Ok(oracles::list(&self.db).await?)
    }

    async fn oracles_by_ids(&self, ids: &[Uuid]) -> DataResult<Vec<OracleRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(oracles::get_by_ids(&self.db, ids).await?)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> DataResult<Vec<UserRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(users::get_by_ids(&self.db, ids).await?)
    }

    async fn user_by_address(&self, address: &str) -> DataResult<Option<UserRow>> {
        Ok(users::get_by_address(&self.db, address).await?)
    }

    async fn leaderboard(
        &self,
        period: LeaderboardPeriod,
        limit: i64,
    ) -> DataResult<Vec<LeaderboardRow>> {
        let since = period.cutoff(Utc::now());
        Ok(leaderboard::top_by_volume(&self.db, since, limit).await?)
    }
}
