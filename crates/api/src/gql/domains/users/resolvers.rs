use async_graphql::{Context, Object, Result};

use crate::gql::error::GqlResultExt;
use crate::gql::types::User;
use crate::state::AppState;

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// Look a user up by wallet address (case-insensitive)
    async fn user(&self, ctx: &Context<'_>, address: String) -> Result<Option<User>> {
        let state = ctx.data::<AppState>()?;
        let row = state
            .market_api()
            .user_by_address(&address)
            .await
            .extended()?;
        Ok(row.map(User::from))
    }
}
