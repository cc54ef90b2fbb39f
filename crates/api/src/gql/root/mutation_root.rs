use async_graphql::MergedObject;

use crate::gql::domains::bets::BetMutation;
use crate::gql::domains::liquidity::LiquidityMutation;
use crate::gql::domains::markets::MarketMutation;

#[derive(MergedObject, Default)]
pub struct MutationRoot(BetMutation, LiquidityMutation, MarketMutation);
