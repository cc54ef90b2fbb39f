pub mod janitor_service;

pub use janitor_service::{spawn_janitor_service, JanitorService, SweepReport};
