use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::LiquidityEventRow;

pub async fn record<'e>(
    executor: impl PgExecutor<'e>,
    market_id: Uuid,
    provider_id: Uuid,
    amount: i64,
) -> SqlxResult<LiquidityEventRow> {
    sqlx::query_as::<_, LiquidityEventRow>(
        r#"
        INSERT INTO liquidity_events (market_id, provider_id, amount)
        VALUES ($1, $2, $3)
        RETURNING id, market_id, provider_id, amount, created_at
        "#,
    )
    .bind(market_id)
    .bind(provider_id)
    .bind(amount)
    .fetch_one(executor)
    .await
}
