//! Driving adapters: the GraphQL-over-HTTP surface.

pub mod graphql;
