use async_graphql::{InputObject, SimpleObject, ID};
use uuid::Uuid;

use crate::datasource::PlaceBet;
use crate::gql::error::GqlError;
use crate::gql::scalars::BigInt;
use crate::gql::types::{Bet, Market, Outcome};

#[derive(InputObject)]
pub struct BetInput {
    pub market_id: ID,
    pub outcome: Outcome,
    pub amount: BigInt,
}

impl TryFrom<BetInput> for PlaceBet {
    type Error = GqlError;

    fn try_from(input: BetInput) -> Result<Self, Self::Error> {
        Ok(Self {
            market_id: Uuid::parse_str(input.market_id.as_str())?,
            outcome: input.outcome.into(),
            amount: input.amount.into(),
        })
    }
}

#[derive(SimpleObject, Clone)]
pub struct BetResult {
    pub bet: Bet,
    /// Market state right after the bet was recorded
    pub market: Market,
}
