//! Membership domain model (the user ↔ workspace join).
//!
//! Memberships are the authorization anchor: the evaluator only ever
//! grants access through the membership a user holds in the target
//! workspace. The (user, workspace) pair is unique — at most one row
//! per tenant per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workspace_id: Uuid,
    /// Workspace role, if one is assigned. May dangle after a role
    /// delete; readers must tolerate that.
    pub role_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub user_id: Uuid,
    pub workspace_id: Uuid,
    pub role_id: Option<Uuid>,
}
