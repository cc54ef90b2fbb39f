use async_graphql::{Context, ErrorExtensions, Object, Result};
use tracing::{info, warn};

use crate::auth::require_user;
use crate::datasource::PlaceBet;
use crate::gql::error::{GqlError, GqlResultExt};
use crate::gql::subscriptions::{publish_market_update, publish_price_update, publish_trade};
use crate::gql::types::{Bet, Market, PriceUpdate, Trade};
use crate::state::AppState;

use super::types::{BetInput, BetResult};

#[derive(Default)]
pub struct BetMutation;

#[Object]
impl BetMutation {
    /// Place a bet at the market's current price.
    ///
    /// The caller's rate-limit bucket is charged first; a rejected call never
    /// reaches the data source.
    async fn place_bet(&self, ctx: &Context<'_>, input: BetInput) -> Result<BetResult> {
        let user = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;

        if let Err(limited) = state.bet_limiter().consume(&user.id.to_string()) {
            warn!(
                user_id = %user.id,
                retry_after_ms = limited.retry_after.as_millis() as u64,
                "Bet rejected by rate limiter"
            );
            return Err(GqlError::from(limited).extend());
        }

        let bet = PlaceBet::try_from(input).extended()?;
        let receipt = state.market_api().place_bet(bet, &user).await.extended()?;

        info!(
            bet_id = %receipt.bet.id,
            market_id = %receipt.market.id,
            user_id = %user.id,
            amount = receipt.bet.amount,
            "Bet placed"
        );

        publish_trade(Trade::from(receipt.trade.clone()));
        publish_price_update(
            receipt.market.id,
            PriceUpdate::from_market(&receipt.market, receipt.trade.created_at),
        );
        let market = Market::from(receipt.market);
        publish_market_update(market.clone());

        Ok(BetResult {
            bet: Bet::from(receipt.bet),
            market,
        })
    }
}
