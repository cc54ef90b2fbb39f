use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::{BetRow, Outcome};

#[derive(Debug, Clone)]
pub struct CreateBet {
    pub market_id: Uuid,
    pub user_id: Uuid,
    pub outcome: Outcome,
    pub amount: i64,
    pub price: f64,
}

pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateBet) -> SqlxResult<BetRow> {
    sqlx::query_as::<_, BetRow>(
        r#"
        INSERT INTO bets (market_id, user_id, outcome, amount, price)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, market_id, user_id, outcome, amount, price, created_at
        "#,
    )
    .bind(data.market_id)
    .bind(data.user_id)
    .bind(data.outcome)
    .bind(data.amount)
    .bind(data.price)
    .fetch_one(executor)
    .await
}

/// All bets on a market, oldest first.
pub async fn list_by_market<'e>(
    executor: impl PgExecutor<'e>,
    market_id: Uuid,
) -> SqlxResult<Vec<BetRow>> {
    sqlx::query_as::<_, BetRow>(
        r#"
        SELECT id, market_id, user_id, outcome, amount, price, created_at
        FROM bets
        WHERE market_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(market_id)
    .fetch_all(executor)
    .await
}
