//! Role domain model.
//!
//! A role is a workspace-scoped named bundle of permission grants.
//! Names are stored lower-case and are unique per workspace by
//! convention. Deleting a role does not delete memberships that
//! reference it; the evaluator treats a dangling reference as "no
//! role-defined grants".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub workspace_id: Uuid,
    /// Lower-case name (e.g., `owner`, `seller`, or a custom name).
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub workspace_id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
}
