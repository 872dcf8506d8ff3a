//! GraphQL backend adapter (hosted store behind an HTTP endpoint).

pub mod client;
pub mod documents;
pub mod wire;

pub use client::GraphqlStore;
