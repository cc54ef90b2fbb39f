pub mod domains;
pub mod error;
pub mod loaders;
pub mod metrics;
pub mod root;
pub mod scalars;
pub mod schema;
pub mod subscriptions;
pub mod types;

pub use root::{MutationRoot, QueryRoot};
pub use schema::{build_schema, MarketSchema};
pub use subscriptions::SubscriptionRoot;
