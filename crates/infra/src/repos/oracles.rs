use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::OracleRow;

pub async fn list<'e>(executor: impl PgExecutor<'e>) -> SqlxResult<Vec<OracleRow>> {
    sqlx::query_as::<_, OracleRow>(
        r#"
        SELECT id, name, endpoint, created_at
        FROM oracles
        ORDER BY name ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<OracleRow>> {
    sqlx::query_as::<_, OracleRow>(
        r#"
        SELECT id, name, endpoint, created_at
        FROM oracles
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn get_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> SqlxResult<Vec<OracleRow>> {
    sqlx::query_as::<_, OracleRow>(
        r#"
        SELECT id, name, endpoint, created_at
        FROM oracles
        WHERE id = ANY($1::uuid[])
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}
