use async_graphql::{Context, Object, Result, ID};
use uuid::Uuid;

use crate::auth::{require_role, Role};
use crate::datasource::NewMarket;
use crate::gql::error::GqlResultExt;
use crate::gql::types::{Market, Oracle};
use crate::state::AppState;
use infra::pagination::page_size;
use infra::repos::MarketFilter;

use super::types::{MarketFilterInput, MarketInput};

#[derive(Default)]
pub struct MarketQuery;

#[Object]
impl MarketQuery {
    async fn market(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Market>> {
        let state = ctx.data::<AppState>()?;
        let market_id = Uuid::parse_str(id.as_str()).extended()?;

        let row = state.market_api().get_market(market_id).await.extended()?;
        Ok(row.map(Market::from))
    }

    /// Markets matching `filter`, most traded first.
    async fn markets(
        &self,
        ctx: &Context<'_>,
        filter: Option<MarketFilterInput>,
        #[graphql(default = 20)] first: Option<i32>,
    ) -> Result<Vec<Market>> {
        let state = ctx.data::<AppState>()?;
        let filter = MarketFilter::try_from(filter.unwrap_or_default()).extended()?;

        let rows = state
            .market_api()
            .list_markets(&filter, page_size(first))
            .await
            .extended()?;

        Ok(rows.into_iter().map(Market::from).collect())
    }

    async fn oracles(&self, ctx: &Context<'_>) -> Result<Vec<Oracle>> {
        let state = ctx.data::<AppState>()?;
        let rows = state.market_api().list_oracles().await.extended()?;
        Ok(rows.into_iter().map(Oracle::from).collect())
    }
}

#[derive(Default)]
pub struct MarketMutation;

#[Object]
impl MarketMutation {
    /// Open a new market (admins only)
    async fn create_market(&self, ctx: &Context<'_>, input: MarketInput) -> Result<Market> {
        let admin = require_role(ctx, Role::Admin)?;
        let state = ctx.data::<AppState>()?;

        let new_market = NewMarket::try_from(input).extended()?;
        let row = state
            .market_api()
            .create_market(new_market, &admin)
            .await
            .extended()?;

        Ok(Market::from(row))
    }
}
