use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Postgres, QueryBuilder, Result as SqlxResult};
use uuid::Uuid;

use crate::models::MarketRow;

const MARKET_COLUMNS: &str = "id, question, probability, volume, liquidity, resolution, oracle_id, created_by, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct MarketFilter {
    pub state: Option<MarketState>,
    pub search: Option<String>,
    pub oracle_id: Option<Uuid>,
    pub min_liquidity: Option<i64>,
}

impl MarketFilter {
    /// In-process evaluation of the same predicate `list` pushes into SQL.
    pub fn matches(&self, market: &MarketRow, now: DateTime<Utc>) -> bool {
        if let Some(state) = self.state {
            let open = market.is_open_at(now);
            if (state == MarketState::Open) != open {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !market
                .question
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if let Some(oracle_id) = self.oracle_id {
            if market.oracle_id != oracle_id {
                return false;
            }
        }
        if let Some(min_liquidity) = self.min_liquidity {
            if market.liquidity < min_liquidity {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct CreateMarket {
    pub question: String,
    pub probability: f64,
    pub liquidity: i64,
    pub resolution: Option<DateTime<Utc>>,
    pub oracle_id: Uuid,
    pub created_by: Option<Uuid>,
}

/// List markets matching `filter`, most traded first.
pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    filter: &MarketFilter,
    now: DateTime<Utc>,
    limit: i64,
) -> SqlxResult<Vec<MarketRow>> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {MARKET_COLUMNS} FROM markets WHERE 1=1"));

    match filter.state {
        Some(MarketState::Open) => {
            query.push(" AND (resolution IS NULL OR resolution > ");
            query.push_bind(now);
            query.push(")");
        }
        Some(MarketState::Closed) => {
            query.push(" AND resolution <= ");
            query.push_bind(now);
        }
        None => {}
    }

    // Literal substring match, no LIKE wildcards
    if let Some(search) = &filter.search {
        query.push(" AND strpos(LOWER(question), ");
        query.push_bind(search.to_lowercase());
        query.push(") > 0");
    }

    if let Some(oracle_id) = filter.oracle_id {
        query.push(" AND oracle_id = ");
        query.push_bind(oracle_id);
    }

    if let Some(min_liquidity) = filter.min_liquidity {
        query.push(" AND liquidity >= ");
        query.push_bind(min_liquidity);
    }

    query.push(" ORDER BY volume DESC, created_at DESC LIMIT ");
    query.push_bind(limit);

    query.build_query_as::<MarketRow>().fetch_all(executor).await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<MarketRow>> {
    sqlx::query_as::<_, MarketRow>(&format!(
        "SELECT {MARKET_COLUMNS} FROM markets WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Same as `get_by_id` but takes a row lock; only meaningful inside a transaction.
pub async fn get_by_id_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<MarketRow>> {
    sqlx::query_as::<_, MarketRow>(&format!(
        "SELECT {MARKET_COLUMNS} FROM markets WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateMarket,
) -> SqlxResult<MarketRow> {
    sqlx::query_as::<_, MarketRow>(&format!(
        r#"
        INSERT INTO markets (question, probability, liquidity, resolution, oracle_id, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {MARKET_COLUMNS}
        "#
    ))
    .bind(&data.question)
    .bind(data.probability)
    .bind(data.liquidity)
    .bind(data.resolution)
    .bind(data.oracle_id)
    .bind(data.created_by)
    .fetch_one(executor)
    .await
}

pub async fn add_volume<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    amount: i64,
) -> SqlxResult<MarketRow> {
    sqlx::query_as::<_, MarketRow>(&format!(
        r#"
        UPDATE markets
        SET volume = volume + $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {MARKET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(amount)
    .fetch_one(executor)
    .await
}

pub async fn add_liquidity<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    amount: i64,
) -> SqlxResult<MarketRow> {
    sqlx::query_as::<_, MarketRow>(&format!(
        r#"
        UPDATE markets
        SET liquidity = liquidity + $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {MARKET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(amount)
    .fetch_one(executor)
    .await
}
