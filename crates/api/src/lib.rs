pub mod app;
pub mod auth;
pub mod config;
pub mod datasource;
pub mod error;
pub mod gql;
pub mod middleware;
pub mod rate_limit;
pub mod services;
pub mod state;

pub use state::AppState;
