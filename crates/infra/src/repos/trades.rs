use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::{BetRow, TradeRow};
use crate::pagination::Keyset;

/// Record the fill for a freshly placed bet.
pub async fn create_for_bet<'e>(executor: impl PgExecutor<'e>, bet: &BetRow) -> SqlxResult<TradeRow> {
    sqlx::query_as::<_, TradeRow>(
        r#"
        INSERT INTO trades (market_id, bet_id, trader_id, outcome, amount, price, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, market_id, bet_id, trader_id, outcome, amount, price, created_at
        "#,
    )
    .bind(bet.market_id)
    .bind(bet.id)
    .bind(bet.user_id)
    .bind(bet.outcome)
    .bind(bet.amount)
    .bind(bet.price)
    .bind(bet.created_at)
    .fetch_one(executor)
    .await
}

/// Newest-first page of a market's trades, starting strictly after `after`.
pub async fn list_by_market<'e>(
    executor: impl PgExecutor<'e>,
    market_id: Uuid,
    after: Option<Keyset>,
    limit: i64,
) -> SqlxResult<Vec<TradeRow>> {
    match after {
        Some(cursor) => {
            sqlx::query_as::<_, TradeRow>(
                r#"
                SELECT id, market_id, bet_id, trader_id, outcome, amount, price, created_at
                FROM trades
                WHERE market_id = $1 AND (created_at, id) < ($2, $3)
                ORDER BY created_at DESC, id DESC
                LIMIT $4
                "#,
            )
            .bind(market_id)
            .bind(cursor.created_at)
            .bind(cursor.id)
            .bind(limit)
            .fetch_all(executor)
            .await
        }
        None => {
            sqlx::query_as::<_, TradeRow>(
                r#"
                SELECT id, market_id, bet_id, trader_id, outcome, amount, price, created_at
                FROM trades
                WHERE market_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
                "#,
            )
            .bind(market_id)
            .bind(limit)
            .fetch_all(executor)
            .await
        }
    }
}
