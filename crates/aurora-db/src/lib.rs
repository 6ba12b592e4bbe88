//! Aurora Database — SurrealDB connection management, schema
//! migrations, and repository implementations for the `aurora-core`
//! traits.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - One repository implementation per `aurora-core` trait

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
