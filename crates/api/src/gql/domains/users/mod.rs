pub mod resolvers;

pub use resolvers::UserQuery;
