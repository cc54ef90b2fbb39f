use async_graphql::dataloader::DataLoader;
use async_graphql::extensions::Tracing;
use async_graphql::Schema;

use super::loaders::{OracleLoader, UserLoader};
use super::metrics::Metrics;
use super::{MutationRoot, QueryRoot, SubscriptionRoot};
use crate::state::AppState;

pub type MarketSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the GraphQL schema and inject shared state (AppState) into the context.
pub fn build_schema(state: AppState) -> MarketSchema {
    let oracle_loader = DataLoader::new(OracleLoader::new(state.market_api().clone()), tokio::spawn);
    let user_loader = DataLoader::new(UserLoader::new(state.market_api().clone()), tokio::spawn);

    let introspection_enabled = state.config().introspection;
    let metrics = state.metrics().clone();

    let mut builder = Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        SubscriptionRoot,
    )
    .data(state) // available in resolvers via ctx.data::<AppState>()
    .data(oracle_loader)
    .data(user_loader)
    .extension(Tracing)
    .extension(Metrics(metrics))
    .limit_depth(15)
    .limit_complexity(500);

    if !introspection_enabled {
        builder = builder.disable_introspection();
    }

    builder.finish()
}
