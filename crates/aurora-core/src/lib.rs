//! Aurora Core — domain models, error taxonomy, and repository traits
//! shared by the tenancy and access-control crates.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{AuroraError, AuroraResult};
