use async_graphql::{InputObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::datasource::NewMarket;
use crate::gql::error::GqlError;
use crate::gql::scalars::BigInt;
use crate::gql::types::MarketStatus;

#[derive(InputObject, Default)]
#[graphql(name = "MarketFilter")]
pub struct MarketFilterInput {
    pub status: Option<MarketStatus>,
    /// Case-insensitive substring of the question.
    pub search: Option<String>,
    pub oracle_id: Option<ID>,
    pub min_liquidity: Option<BigInt>,
}

impl TryFrom<MarketFilterInput> for infra::repos::MarketFilter {
    type Error = GqlError;

    fn try_from(input: MarketFilterInput) -> Result<Self, Self::Error> {
        let oracle_id = input
            .oracle_id
            .map(|id| Uuid::parse_str(id.as_str()))
            .transpose()?;

        Ok(Self {
            state: input.status.map(Into::into),
            search: input
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            oracle_id,
            min_liquidity: input.min_liquidity.map(i64::from),
        })
    }
}

#[derive(InputObject)]
pub struct MarketInput {
    pub question: String,
    pub oracle_id: ID,
    pub resolution: Option<DateTime<Utc>>,
    #[graphql(default = 0.5)]
    pub initial_probability: f64,
    #[graphql(default)]
    pub initial_liquidity: BigInt,
}

impl TryFrom<MarketInput> for NewMarket {
    type Error = GqlError;

    fn try_from(input: MarketInput) -> Result<Self, Self::Error> {
        Ok(Self {
            question: input.question,
            oracle_id: Uuid::parse_str(input.oracle_id.as_str())?,
            resolution: input.resolution,
            initial_probability: input.initial_probability,
            initial_liquidity: input.initial_liquidity.into(),
        })
    }
}
