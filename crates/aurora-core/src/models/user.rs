//! User domain model.
//!
//! Users are global identities: one row per email, shared across
//! workspaces. Per-workspace access is granted through memberships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Legacy single global role carried on the user record.
///
/// Predates per-workspace roles and is still load-bearing: the
/// permission evaluator falls back to it when a membership has no
/// workspace role attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    Admin,
    Manager,
    Sales,
}

impl GlobalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::Admin => "admin",
            GlobalRole::Manager => "manager",
            GlobalRole::Sales => "sales",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Globally unique.
    pub email: String,
    /// Argon2id PHC-format hash.
    pub password_hash: String,
    pub role: GlobalRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Already hashed — services hash before handing off to storage.
    pub password_hash: String,
    pub role: GlobalRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<GlobalRole>,
    pub active: Option<bool>,
}
