use async_graphql::{Context, Object, Result};
use infra::repos::LEADERBOARD_SIZE;

use crate::gql::error::GqlResultExt;
use crate::gql::types::User;
use crate::state::AppState;

use super::types::{ranked_user, Period};

#[derive(Default)]
pub struct LeaderboardQuery;

#[Object]
impl LeaderboardQuery {
    /// Top traders by bet volume within `period`
    async fn leaderboard(&self, ctx: &Context<'_>, period: Period) -> Result<Vec<User>> {
        let state = ctx.data::<AppState>()?;

        let rows = state
            .market_api()
            .leaderboard(period.into(), LEADERBOARD_SIZE)
            .await
            .extended()?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| ranked_user(index + 1, row))
            .collect())
    }
}
