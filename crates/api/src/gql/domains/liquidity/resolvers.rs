use async_graphql::{Context, Object, Result, ID};
use tracing::info;
use uuid::Uuid;

use crate::auth::require_user;
use crate::gql::error::GqlResultExt;
use crate::gql::scalars::BigInt;
use crate::gql::subscriptions::publish_market_update;
use crate::gql::types::Market;
use crate::state::AppState;

use super::types::LiquidityResult;

#[derive(Default)]
pub struct LiquidityMutation;

#[Object]
impl LiquidityMutation {
    async fn add_liquidity(
        &self,
        ctx: &Context<'_>,
        market_id: ID,
        amount: BigInt,
    ) -> Result<LiquidityResult> {
        let provider = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let market_uuid = Uuid::parse_str(market_id.as_str()).extended()?;

        let receipt = state
            .market_api()
            .add_liquidity(market_uuid, amount.into(), &provider)
            .await
            .extended()?;

        info!(
            market_id = %market_uuid,
            provider_id = %provider.id,
            amount = receipt.event.amount,
            total_liquidity = receipt.market.liquidity,
            "Liquidity added"
        );

        publish_market_update(Market::from(receipt.market.clone()));

        Ok(LiquidityResult::from(receipt))
    }
}
