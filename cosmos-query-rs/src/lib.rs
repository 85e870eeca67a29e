//! # cosmos-query-rs
//!
//! Azure Cosmos DB query client for operational runbooks.
//!
//! This crate lets a runbook connect to a Cosmos DB account (shared key or
//! Azure AD, with an optional control-plane key-retrieval path for
//! principals without data-plane RBAC) and execute caller-supplied SQL
//! queries against named database/container pairs:
//!
//! - `CosmosQueryClient`: connection handling and query execution
//! - `QuerySpec`: one query request (database, container, text, parameters)
//! - `CosmosCredential` / `ServicePrincipal`: authentication material
//! - `CosmosError`: the failure taxonomy
//!
//! Queries always fan out across partitions and drain every continuation
//! page; `count_query_results` reduces a result set to a single count for
//! both aggregate and plain row-selecting queries. Every operation is
//! attempt-once: there are no retries and no timeouts beyond what the
//! transport applies.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
mod management;

pub use auth::CosmosCredential;
pub use client::{CosmosQueryClient, QuerySpec};
pub use config::{ClientOptions, ServicePrincipal};
pub use error::{CosmosError, Result};

#[cfg(test)]
mod tests;
