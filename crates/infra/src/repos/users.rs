use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::UserRow;

/// Addresses are stored lowercased so lookups are case-insensitive.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

pub async fn get_by_address<'e>(
    executor: impl PgExecutor<'e>,
    address: &str,
) -> SqlxResult<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, address, display_name, created_at FROM users WHERE address = $1",
    )
    .bind(normalize_address(address))
    .fetch_optional(executor)
    .await
}

pub async fn get_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> SqlxResult<Vec<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, address, display_name, created_at FROM users WHERE id = ANY($1::uuid[])",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

/// Register a user the identity provider vouched for, or return the
/// existing row. The stored address wins over a differing claim.
pub async fn ensure<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    address: &str,
) -> SqlxResult<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, address)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET address = users.address
        RETURNING id, address, display_name, created_at
        "#,
    )
    .bind(id)
    .bind(normalize_address(address))
    .fetch_one(executor)
    .await
}
