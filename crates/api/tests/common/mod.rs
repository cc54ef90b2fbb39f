#![allow(dead_code)]

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use api::auth::{AuthConfig, AuthUser, Role};
use api::config::{BetRateLimitConfig, ServerConfig};
use api::datasource::{
    BetReceipt, DataResult, InMemoryMarketApi, LiquidityReceipt, MarketApi, NewMarket,
    PgMarketApi, PlaceBet, MANUAL_ORACLE_ID,
};
use api::gql::{build_schema, MarketSchema};
use api::AppState;
use async_graphql::{Request, Variables};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use infra::models::{BetRow, LeaderboardRow, MarketRow, OracleRow, TradeRow, UserRow};
use infra::pagination::Keyset;
use infra::repos::{LeaderboardPeriod, MarketFilter};
use serde_json::Value as Json;
use sqlx::PgPool;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret-with-enough-entropy";

pub struct TestApp {
    pub state: AppState,
    pub schema: MarketSchema,
    pub store: Arc<InMemoryMarketApi>,
}

pub fn test_config() -> ServerConfig {
    ServerConfig::in_memory(AuthConfig {
        jwt_secret: JWT_SECRET.to_string(),
        access_token_expiration_minutes: 60,
    })
}

/// In-memory app with a generous bet rate limit.
pub fn setup_test_app() -> TestApp {
    let mut config = test_config();
    generous_bet_limit(&mut config);
    setup_with_config(config)
}

pub fn setup_with_config(config: ServerConfig) -> TestApp {
    let store = Arc::new(InMemoryMarketApi::new());
    let state = AppState::new(store.clone(), config);
    let schema = build_schema(state.clone());
    TestApp {
        state,
        schema,
        store,
    }
}

fn generous_bet_limit(config: &mut ServerConfig) {
    config.bet_rate_limit = BetRateLimitConfig {
        per_minute: 600,
        burst: 100,
    };
}

/// Direct write access to whichever store backs a [`BackendApp`].
pub enum Store {
    Memory(Arc<InMemoryMarketApi>),
    Postgres(PgPool),
}

impl Store {
    pub async fn insert_market(&self, row: &MarketRow) {
        match self {
            Store::Memory(store) => store.insert_market(row.clone()),
            Store::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO markets (id, question, probability, volume, liquidity, resolution,
                                         oracle_id, created_by, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    "#,
                )
                .bind(row.id)
                .bind(&row.question)
                .bind(row.probability)
                .bind(row.volume)
                .bind(row.liquidity)
                .bind(row.resolution)
                .bind(row.oracle_id)
                .bind(row.created_by)
                .bind(row.created_at)
                .bind(row.updated_at)
                .execute(pool)
                .await
                .expect("Failed to seed market");
            }
        }
    }

    /// Drop a market and, through the cascades, its bets, trades and
    /// liquidity events. Keeps the shared test database from accumulating
    /// leaderboard volume across runs.
    pub async fn remove_market(&self, id: Uuid) {
        if let Store::Postgres(pool) = self {
            sqlx::query("DELETE FROM markets WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await
                .expect("Failed to remove market");
        }
    }
}

/// A fully wired schema over one concrete data source.
pub struct BackendApp {
    pub name: &'static str,
    pub state: AppState,
    pub schema: MarketSchema,
    pub store: Store,
}

impl BackendApp {
    pub async fn seed_market(&self, question: &str, probability: f64) -> MarketRow {
        let row = market_row(question, probability, 1_000, Some(Utc::now() + Duration::days(7)));
        self.store.insert_market(&row).await;
        row
    }

    pub async fn seed(&self, row: MarketRow) -> MarketRow {
        self.store.insert_market(&row).await;
        row
    }
}

pub fn memory_backend() -> BackendApp {
    let mut config = test_config();
    generous_bet_limit(&mut config);

    let store = Arc::new(InMemoryMarketApi::new());
    let state = AppState::new(store.clone(), config);
    BackendApp {
        name: "memory",
        schema: build_schema(state.clone()),
        state,
        store: Store::Memory(store),
    }
}

/// Postgres-backed app against `TEST_DATABASE_URL`, migrated on connect.
/// `None` when the variable is unset so the suite still runs without a database.
pub async fn postgres_backend() -> Option<BackendApp> {
    let database_url = env::var("TEST_DATABASE_URL").ok()?;

    let pool = infra::db::connect(&database_url, 5)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate test database");

    let mut config = test_config();
    generous_bet_limit(&mut config);

    let state = AppState::new(Arc::new(PgMarketApi::new(pool.clone())), config);
    Some(BackendApp {
        name: "postgres",
        schema: build_schema(state.clone()),
        state,
        store: Store::Postgres(pool),
    })
}

/// The in-memory backend, plus Postgres when a test database is configured.
pub async fn backends() -> Vec<BackendApp> {
    let mut apps = vec![memory_backend()];
    match postgres_backend().await {
        Some(app) => apps.push(app),
        None => eprintln!("TEST_DATABASE_URL not set, skipping the postgres backend"),
    }
    apps
}

/// Helper function to execute GraphQL queries and mutations
pub async fn execute_graphql(
    schema: &MarketSchema,
    query: &str,
    variables: Option<Variables>,
    caller: Option<AuthUser>,
) -> async_graphql::Response {
    let mut request = Request::new(query);

    if let Some(vars) = variables {
        request = request.variables(vars);
    }

    if let Some(user) = caller {
        request = request.data(user);
    }

    schema.execute(request).await
}

pub fn trader_user(address: &str) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        address: address.to_string(),
        role: Role::Trader,
    }
}

pub fn admin_user() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        address: format!("0xadmin{}", Uuid::new_v4().simple()),
        role: Role::Admin,
    }
}

/// Insert an open market directly into the store.
pub fn seed_market(store: &InMemoryMarketApi, question: &str, probability: f64) -> MarketRow {
    seed_market_with(store, question, probability, 1_000, Some(Utc::now() + Duration::days(7)))
}

pub fn seed_market_with(
    store: &InMemoryMarketApi,
    question: &str,
    probability: f64,
    liquidity: i64,
    resolution: Option<DateTime<Utc>>,
) -> MarketRow {
    let row = market_row(question, probability, liquidity, resolution);
    store.insert_market(row.clone());
    row
}

/// An open-by-default market on the manual oracle with no volume yet.
pub fn market_row(
    question: &str,
    probability: f64,
    liquidity: i64,
    resolution: Option<DateTime<Utc>>,
) -> MarketRow {
    let now = Utc::now();
    MarketRow {
        id: Uuid::new_v4(),
        question: question.to_string(),
        probability,
        volume: 0,
        liquidity,
        resolution,
        oracle_id: MANUAL_ORACLE_ID,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub async fn place_bet(
    schema: &MarketSchema,
    user: &AuthUser,
    market_id: Uuid,
    outcome: &str,
    amount: &str,
) -> async_graphql::Response {
    let query = r#"
        mutation PlaceBet($input: BetInput!) {
            placeBet(input: $input) {
                bet { id outcome amount price }
                market { id volume probability }
            }
        }
    "#;
    let variables = Variables::from_json(serde_json::json!({
        "input": { "marketId": market_id.to_string(), "outcome": outcome, "amount": amount }
    }));

    execute_graphql(schema, query, Some(variables), Some(user.clone())).await
}

pub fn data(response: async_graphql::Response) -> Json {
    assert!(
        response.errors.is_empty(),
        "unexpected errors: {:?}",
        response.errors
    );
    response.data.into_json().expect("response data is JSON")
}

/// `extensions.code` of the first error, if any.
pub fn error_code(response: &async_graphql::Response) -> Option<String> {
    let json = serde_json::to_value(response).ok()?;
    json["errors"][0]["extensions"]["code"]
        .as_str()
        .map(str::to_string)
}

/// Wraps the in-memory store and counts how often bets reach it.
pub struct CountingMarketApi {
    inner: Arc<InMemoryMarketApi>,
    place_bet_calls: AtomicUsize,
}

impl CountingMarketApi {
    pub fn new(inner: Arc<InMemoryMarketApi>) -> Self {
        Self {
            inner,
            place_bet_calls: AtomicUsize::new(0),
        }
    }

    pub fn place_bet_calls(&self) -> usize {
        self.place_bet_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketApi for CountingMarketApi {
    async fn health(&self) -> DataResult<()> {
        self.inner.health().await
    }

    async fn get_market(&self, id: Uuid) -> DataResult<Option<MarketRow>> {
        self.inner.get_market(id).await
    }

    async fn list_markets(&self, filter: &MarketFilter, limit: i64) -> DataResult<Vec<MarketRow>> {
        self.inner.list_markets(filter, limit).await
    }

    async fn create_market(&self, input: NewMarket, creator: &AuthUser) -> DataResult<MarketRow> {
        self.inner.create_market(input, creator).await
    }

    async fn place_bet(&self, input: PlaceBet, user: &AuthUser) -> DataResult<BetReceipt> {
        self.place_bet_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.place_bet(input, user).await
    }

    async fn add_liquidity(
        &self,
        market_id: Uuid,
        amount: i64,
        provider: &AuthUser,
    ) -> DataResult<LiquidityReceipt> {
        self.inner.add_liquidity(market_id, amount, provider).await
    }

    async fn bets_for_market(&self, market_id: Uuid) -> DataResult<Vec<BetRow>> {
        self.inner.bets_for_market(market_id).await
    }

    async fn trades_for_market(
        &self,
        market_id: Uuid,
        after: Option<Keyset>,
        limit: i64,
    ) -> DataResult<Vec<TradeRow>> {
        self.inner.trades_for_market(market_id, after, limit).await
    }

    async fn list_oracles(&self) -> DataResult<Vec<OracleRow>> {
        self.inner.list_oracles().await
    }

    async fn oracles_by_ids(&self, ids: &[Uuid]) -> DataResult<Vec<OracleRow>> {
        self.inner.oracles_by_ids(ids).await
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> DataResult<Vec<UserRow>> {
        self.inner.users_by_ids(ids).await
    }

    async fn user_by_address(&self, address: &str) -> DataResult<Option<UserRow>> {
        self.inner.user_by_address(address).await
    }

    async fn leaderboard(
        &self,
        period: LeaderboardPeriod,
        limit: i64,
    ) -> DataResult<Vec<LeaderboardRow>> {
        self.inner.leaderboard(period, limit).await
    }
}
