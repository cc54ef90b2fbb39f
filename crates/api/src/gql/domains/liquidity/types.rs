use async_graphql::{SimpleObject, ID};
use chrono::{DateTime, Utc};

use crate::datasource::LiquidityReceipt;
use crate::gql::scalars::BigInt;
use crate::gql::types::Market;

#[derive(SimpleObject, Clone)]
pub struct LiquidityResult {
    pub market_id: ID,
    pub provider_id: ID,
    /// Amount added by this call
    pub amount: BigInt,
    /// Market liquidity after the addition
    pub total_liquidity: BigInt,
    pub created_at: DateTime<Utc>,
    pub market: Option<Market>,
}

impl From<LiquidityReceipt> for LiquidityResult {
    fn from(receipt: LiquidityReceipt) -> Self {
        Self {
            market_id: receipt.event.market_id.into(),
            provider_id: receipt.event.provider_id.into(),
            amount: BigInt(receipt.event.amount),
            total_liquidity: BigInt(receipt.market.liquidity),
            created_at: receipt.event.created_at,
            market: Some(Market::from(receipt.market)),
        }
    }
}
