//! Infrastructure adapters. Implement outbound ports.
//!
//! Record stores, GraphQL backend, notices, session, terminal UI. Map errors to DomainError.

pub mod graphql;
pub mod notify;
pub mod persistence;
pub mod session;
pub mod ui;
