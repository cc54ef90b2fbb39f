use async_graphql::MergedObject;

use crate::gql::domains::leaderboard::LeaderboardQuery;
use crate::gql::domains::markets::MarketQuery;
use crate::gql::domains::users::UserQuery;

#[derive(MergedObject, Default)]
pub struct QueryRoot(MarketQuery, UserQuery, LeaderboardQuery);
