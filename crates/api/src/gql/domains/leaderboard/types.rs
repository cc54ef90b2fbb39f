use async_graphql::Enum;

use infra::models::LeaderboardRow;

use crate::gql::scalars::BigInt;
use crate::gql::types::User;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum Period {
    /// Last 24 hours
    Day,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    AllTime,
}

impl From<Period> for infra::repos::LeaderboardPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::Day => infra::repos::LeaderboardPeriod::Day,
            Period::Week => infra::repos::LeaderboardPeriod::Week,
            Period::Month => infra::repos::LeaderboardPeriod::Month,
            Period::AllTime => infra::repos::LeaderboardPeriod::AllTime,
        }
    }
}

/// Leaderboard entry at 1-based `rank`.
pub fn ranked_user(rank: usize, row: LeaderboardRow) -> User {
    User {
        id: row.user_id.into(),
        address: row.address,
        display_name: row.display_name,
        created_at: row.created_at,
        rank: Some(saturating_i32(rank)),
        period_volume: Some(BigInt(row.volume)),
        bet_count: Some(saturating_i32(row.bet_count)),
    }
}

fn saturating_i32<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}
