//! Domain models for the Aurora tenancy core.
//!
//! These are the types shared across all crates. Everything is scoped
//! to a workspace (the tenant root) except [`user::User`], which is a
//! global identity that may belong to several workspaces through
//! [`membership::Membership`] records.

pub mod invite;
pub mod membership;
pub mod permission;
pub mod role;
pub mod user;
pub mod workspace;
