use chrono::{DateTime, Duration, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};

use crate::models::LeaderboardRow;

pub const LEADERBOARD_SIZE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardPeriod {
    Day,
    Week,
    Month,
    AllTime,
}

impl LeaderboardPeriod {
    /// Earliest bet timestamp that counts toward the period, if bounded.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            LeaderboardPeriod::Day => Some(now - Duration::hours(24)),
            LeaderboardPeriod::Week => Some(now - Duration::days(7)),
            LeaderboardPeriod::Month => Some(now - Duration::days(30)),
            LeaderboardPeriod::AllTime => None,
        }
    }
}

/// Users ranked by bet volume placed at or after `since`.
pub async fn top_by_volume<'e>(
    executor: impl PgExecutor<'e>,
    since: Option<DateTime<Utc>>,
    limit: i64,
) -> SqlxResult<Vec<LeaderboardRow>> {
    sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT u.id AS user_id, u.address, u.display_name, u.created_at,
               COALESCE(SUM(b.amount), 0)::BIGINT AS volume,
               COUNT(b.id) AS bet_count
        FROM users u
        JOIN bets b ON b.user_id = u.id
        WHERE ($1::timestamptz IS NULL OR b.created_at >= $1)
        GROUP BY u.id, u.address, u.display_name, u.created_at
        ORDER BY volume DESC, bet_count DESC, u.address ASC
        LIMIT $2
        "#,
    )
    .bind(since)
    .bind(limit)
    .fetch_all(executor)
    .await
}
