//! Invite domain model.
//!
//! An invite is an ephemeral onboarding token tying a recipient email
//! to a workspace and (optionally) a target role. It is created by an
//! admin, mutated exactly once (acceptance) or deleted (revocation),
//! and must never be redeemable after acceptance or expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub id: Uuid,
    /// Recipient email; redemption attaches (or creates) the user
    /// holding this address.
    pub email: String,
    /// Opaque unguessable token, globally unique.
    pub token: String,
    /// Role the membership will receive on redemption.
    pub role_id: Option<Uuid>,
    pub workspace_id: Uuid,
    pub expires_at: DateTime<Utc>,
    /// Monotonic false → true; set exactly once on redemption.
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invite {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvite {
    pub workspace_id: Uuid,
    pub email: String,
    pub token: String,
    pub role_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful redemption, used by the boundary to place
/// the new session into the correct tenant context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRedemption {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
}
