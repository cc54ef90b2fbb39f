use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use infra::models::{
    BetRow, LeaderboardRow, LiquidityEventRow, MarketRow, OracleRow, TradeRow, UserRow,
};
use infra::pagination::Keyset;
use infra::repos::users::normalize_address;
use infra::repos::{LeaderboardPeriod, MarketFilter};

use super::{
    checked_total, validate_bet, validate_liquidity, validate_new_market, BetReceipt, DataResult,
    DataSourceError, LiquidityReceipt, MarketApi, NewMarket, PlaceBet, MANUAL_ORACLE_ID,
};
use crate::auth::AuthUser;

/// Postgres keeps microseconds; match it so cursors round-trip.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Default)]
struct MemoryStore {
    oracles: HashMap<Uuid, OracleRow>,
    markets: HashMap<Uuid, MarketRow>,
    users: HashMap<Uuid, UserRow>,
    bets: Vec<BetRow>,
    trades: Vec<TradeRow>,
    liquidity_events: Vec<LiquidityEventRow>,
}

impl MemoryStore {
    fn ensure_user(&mut self, id: Uuid, address: &str) -> DataResult<UserRow> {
        if let Some(existing) = self.users.get(&id) {
            return Ok(existing.clone());
        }

        let address = normalize_address(address);
        if self.users.values().any(|u| u.address == address) {
            return Err(DataSourceError::Invalid(format!(
                "Address {address} is already registered to another user"
            )));
        }

        let row = UserRow {
            id,
            address,
            display_name: None,
            created_at: now(),
        };
        self.users.insert(id, row.clone());
        Ok(row)
    }
}

/// Process-local market data source. Nothing survives a restart.
pub struct InMemoryMarketApi {
    store: RwLock<MemoryStore>,
}

impl Default for InMemoryMarketApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMarketApi {
    /// Empty store holding only the manual oracle.
    pub fn new() -> Self {
        let api = Self {
            store: RwLock::new(MemoryStore::default()),
        };
        api.store.write().oracles.insert(
            MANUAL_ORACLE_ID,
            OracleRow {
                id: MANUAL_ORACLE_ID,
                name: "manual".to_string(),
                endpoint: "manual://operator".to_string(),
                created_at: now(),
            },
        );
        api
    }

    /// Register an additional oracle and return it.
    pub fn add_oracle(&self, name: &str, endpoint: &str) -> OracleRow {
        let row = OracleRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            created_at: now(),
        };
        self.store.write().oracles.insert(row.id, row.clone());
        row
    }

    /// Insert a market row as-is, bypassing creation checks.
    pub fn insert_market(&self, market: MarketRow) {
        self.store.write().markets.insert(market.id, market);
    }
}

#[async_trait]
impl MarketApi for InMemoryMarketApi {
    async fn health(&self) -> DataResult<()> {
        Ok(())
    }

    async fn get_market(&self, id: Uuid) -> DataResult<Option<MarketRow>> {
        Ok(self.store.read().markets.get(&id).cloned())
    }

    async fn list_markets(&self, filter: &MarketFilter, limit: i64) -> DataResult<Vec<MarketRow>> {
        let now = now();
        let store = self.store.read();

        let mut rows: Vec<MarketRow> = store
            .markets
            .values()
            .filter(|m| filter.matches(m, now))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            b.volume
                .cmp(&a.volume)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        rows.truncate(limit.max(0) as usize);

        Ok(rows)
    }

    async fn create_market(&self, input: NewMarket, creator: &AuthUser) -> DataResult<MarketRow> {
        let input = validate_new_market(input)?;
        let mut store = self.store.write();

        if !store.oracles.contains_key(&input.oracle_id) {
            return Err(DataSourceError::not_found("oracle", input.oracle_id));
        }

        let creator_row = store.ensure_user(creator.id, &creator.address)?;
        let now = now();
        let market = MarketRow {
            id: Uuid::new_v4(),
            question: input.question,
            probability: input.initial_probability,
            volume: 0,
            liquidity: input.initial_liquidity,
            resolution: input.resolution,
            oracle_id: input.oracle_id,
            created_by: Some(creator_row.id),
            created_at: now,
            updated_at: now,
        };
        store.markets.insert(market.id, market.clone());

        Ok(market)
    }

    async fn place_bet(&self, input: PlaceBet, user: &AuthUser) -> DataResult<BetReceipt> {
        validate_bet(&input)?;

        let now = now();
        let mut store = self.store.write();

        let market = store
            .markets
            .get(&input.market_id)
            .cloned()
            .ok_or_else(|| DataSourceError::not_found("market", input.market_id))?;

        if !market.is_open_at(now) {
            return Err(DataSourceError::Closed(market.id));
        }

        let volume = checked_total(market.volume, input.amount, "volume")?;

        let trader = store.ensure_user(user.id, &user.address)?;

        let bet = BetRow {
            id: Uuid::new_v4(),
            market_id: market.id,
            user_id: trader.id,
            outcome: input.outcome,
            amount: input.amount,
            price: market.price_for(input.outcome),
            created_at: now,
        };
        let trade = TradeRow {
            id: Uuid::new_v4(),
            market_id: bet.market_id,
            bet_id: bet.id,
            trader_id: bet.user_id,
            outcome: bet.outcome,
            amount: bet.amount,
            price: bet.price,
            created_at: bet.created_at,
        };

        let updated = MarketRow {
            volume,
            updated_at: now,
            ..market
        };
        store.markets.insert(updated.id, updated.clone());
        store.bets.push(bet.clone());
        store.trades.push(trade.clone());

        Ok(BetReceipt {
            bet,
            trade,
            market: updated,
        })
    }

    async fn add_liquidity(
        &self,
        market_id: Uuid,
        amount: i64,
        provider: &AuthUser,
    ) -> DataResult<LiquidityReceipt> {
        validate_liquidity(amount)?;

        let now = now();
        let mut store = self.store.write();

        let market = store
            .markets
            .get(&market_id)
            .cloned()
            .ok_or_else(|| DataSourceError::not_found("market", market_id))?;

        let liquidity = checked_total(market.liquidity, amount, "liquidity")?;

        let provider_row = store.ensure_user(provider.id, &provider.address)?;

        let event = LiquidityEventRow {
            id: Uuid::new_v4(),
            market_id,
            provider_id: provider_row.id,
            amount,
            created_at: now,
        };
        let updated = MarketRow {
            liquidity,
            updated_at: now,
            ..market
        };
        store.markets.insert(market_id, updated.clone());
        store.liquidity_events.push(event.clone());

        Ok(LiquidityReceipt {
            event,
            market: updated,
        })
    }

    async fn bets_for_market(&self, market_id: Uuid) -> DataResult<Vec<BetRow>> {
        let store = self.store.read();
        let mut rows: Vec<BetRow> = store
            .bets
            .iter()
            .filter(|b| b.market_id == market_id)
            .cloned()
            .collect();
        rows.sort_by_key(|b| (b.created_at, b.id));
        Ok(rows)
    }

    async fn trades_for_market(
        &self,
        market_id: Uuid,
        after: Option<Keyset>,
        limit: i64,
    ) -> DataResult<Vec<TradeRow>> {
        let store = self.store.read();
        let mut rows: Vec<TradeRow> = store
            .trades
            .iter()
            .filter(|t| t.market_id == market_id)
            .filter(|t| after.map_or(true, |cursor| cursor.admits(t.created_at, t.id)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn list_oracles(&self) -> DataResult<Vec<OracleRow>> {
        let mut rows: Vec<OracleRow> = self.store.read().oracles.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn oracles_by_ids(&self, ids: &[Uuid]) -> DataResult<Vec<OracleRow>> {
        let store = self.store.read();
        Ok(ids
            .iter()
            .filter_map(|id| store.oracles.get(id).cloned())
            .collect())
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> DataResult<Vec<UserRow>> {
        let store = self.store.read();
        Ok(ids
            .iter()
            .filter_map(|id| store.users.get(id).cloned())
            .collect())
    }

    async fn user_by_address(&self, address: &str) -> DataResult<Option<UserRow>> {
        let address = normalize_address(address);
        let store = self.store.read();
        Ok(store
            .users
            .values()
            .find(|u| u.address == address)
            .cloned())
    }

    async fn leaderboard(
        &self,
        period: LeaderboardPeriod,
        limit: i64,
    ) -> DataResult<Vec<LeaderboardRow>> {
        let since = period.cutoff(now());
        let store = self.store.read();

        let mut totals: HashMap<Uuid, (i64, i64)> = HashMap::new();
        for bet in store
            .bets
            .iter()
            .filter(|b| since.map_or(true, |cutoff| b.created_at >= cutoff))
        {
            let entry = totals.entry(bet.user_id).or_insert((0, 0));
            entry.0 = entry.0.saturating_add(bet.amount);
            entry.1 += 1;
        }

        let mut rows: Vec<LeaderboardRow> = totals
            .into_iter()
            .filter_map(|(user_id, (volume, bet_count))| {
                store.users.get(&user_id).map(|u| LeaderboardRow {
                    user_id,
                    address: u.address.clone(),
                    display_name: u.display_name.clone(),
                    created_at: u.created_at,
                    volume,
                    bet_count,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.volume
                .cmp(&a.volume)
                .then_with(|| b.bet_count.cmp(&a.bet_count))
                .then_with(|| a.address.cmp(&b.address))
        });
        rows.truncate(limit.max(0) as usize);

        Ok(rows)
    }
}
