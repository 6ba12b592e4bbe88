//! Invite lifecycle — create → deliver → redeem → (optionally revoke).
//!
//! An invite moves a user from "invited" to "member with a role"
//! exactly once. Redemption is guarded by an atomic compare-and-set
//! on the `accepted` flag so that concurrent redemption attempts on
//! the same token race safely: at most one succeeds, the loser
//! observes `InviteAlreadyUsed`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use aurora_core::error::{AuroraError, AuroraResult};
use aurora_core::models::invite::{CreateInvite, Invite, InviteRedemption};
use aurora_core::models::membership::CreateMembership;
use aurora_core::models::user::{CreateUser, GlobalRole, UpdateUser};
use aurora_core::repository::{
    InviteRepository, MembershipRepository, PaginatedResult, Pagination, UserRepository,
    WorkspaceRepository,
};

use crate::config::AccessConfig;
use crate::password;

/// Caller-supplied fields for invite creation.
#[derive(Debug, Clone)]
pub struct CreateInviteRequest {
    pub email: String,
    pub role_id: Option<Uuid>,
    /// Validity window in days; bounded 1–30, default 7.
    pub days_valid: Option<u32>,
}

/// A freshly created invite plus its shareable redemption URL.
#[derive(Debug, Clone)]
pub struct CreatedInvite {
    pub invite: Invite,
    pub invite_url: String,
}

/// Generate a cryptographically random opaque invite token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_invite_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Invite lifecycle manager.
///
/// Generic over repository implementations so the lifecycle logic has
/// no dependency on the database crate.
pub struct InviteService<I, U, M, W>
where
    I: InviteRepository,
    U: UserRepository,
    M: MembershipRepository,
    W: WorkspaceRepository,
{
    invite_repo: I,
    user_repo: U,
    membership_repo: M,
    workspace_repo: W,
    config: AccessConfig,
}

impl<I, U, M, W> InviteService<I, U, M, W>
where
    I: InviteRepository,
    U: UserRepository,
    M: MembershipRepository,
    W: WorkspaceRepository,
{
    pub fn new(
        invite_repo: I,
        user_repo: U,
        membership_repo: M,
        workspace_repo: W,
        config: AccessConfig,
    ) -> Self {
        Self {
            invite_repo,
            user_repo,
            membership_repo,
            workspace_repo,
            config,
        }
    }

    /// Create an invite tied to the acting admin's workspace and
    /// build its redemption URL.
    ///
    /// The URL base is chosen so an invited user always lands on the
    /// tenant's own entry point: the workspace's custom domain first,
    /// then the configured base URL, then the request's own host.
    pub async fn create(
        &self,
        workspace_id: Uuid,
        request: CreateInviteRequest,
        request_host: Option<&str>,
    ) -> AuroraResult<CreatedInvite> {
        let days = request.days_valid.unwrap_or(self.config.invite_default_days);
        if days < self.config.invite_min_days || days > self.config.invite_max_days {
            return Err(AuroraError::Validation {
                message: format!(
                    "days_valid must be between {} and {}",
                    self.config.invite_min_days, self.config.invite_max_days
                ),
            });
        }

        let workspace = self.workspace_repo.get_by_id(workspace_id).await?;

        let token = generate_invite_token();
        let expires_at = Utc::now() + Duration::days(days as i64);

        let invite = self
            .invite_repo
            .create(CreateInvite {
                workspace_id,
                email: request.email,
                token: token.clone(),
                role_id: request.role_id,
                expires_at,
            })
            .await?;

        let base = if !workspace.domain.is_empty() {
            format!("https://{}", workspace.domain)
        } else if let Some(base_url) = &self.config.base_url {
            base_url.clone()
        } else {
            format!("http://{}", request_host.unwrap_or_default())
        };
        let invite_url = format!("{base}{}?token={token}", self.config.invite_accept_path);

        info!(%workspace_id, invite_id = %invite.id, "invite created");

        Ok(CreatedInvite { invite, invite_url })
    }

    /// Redeem an invite: attach (or create) the global user holding
    /// the invited email, upsert their membership in the inviting
    /// workspace with the invite's role, and burn the token.
    pub async fn redeem(
        &self,
        token: &str,
        name: &str,
        new_password: &str,
    ) -> AuroraResult<InviteRedemption> {
        // 1. Token lookup; missing tokens surface as NotFound.
        let invite = self.invite_repo.get_by_token(token).await?;

        // 2. Single-use, independent of expiry.
        if invite.accepted {
            return Err(AuroraError::InviteAlreadyUsed);
        }

        // 3. Expiry, even if never accepted.
        if invite.is_expired(Utc::now()) {
            return Err(AuroraError::InviteExpired);
        }

        // 4. Hash before branching on user existence, so the
        //    existing-user and new-user paths cost the same.
        let password_hash = password::hash_password(new_password)?;

        let user = match self.user_repo.get_by_email(&invite.email).await {
            Ok(existing) => {
                self.user_repo
                    .update(
                        existing.id,
                        UpdateUser {
                            name: Some(name.to_string()),
                            password_hash: Some(password_hash),
                            ..Default::default()
                        },
                    )
                    .await?
            }
            Err(AuroraError::NotFound { .. }) => {
                self.user_repo
                    .create(CreateUser {
                        name: name.to_string(),
                        email: invite.email.clone(),
                        password_hash,
                        role: GlobalRole::Sales,
                    })
                    .await?
            }
            Err(e) => return Err(e),
        };

        // 5. Exactly one membership per (user, workspace); an
        //    existing one is re-pointed at the invite's role.
        self.membership_repo
            .upsert(CreateMembership {
                user_id: user.id,
                workspace_id: invite.workspace_id,
                role_id: invite.role_id,
            })
            .await?;

        // 6. Commit point: the CAS fails with InviteAlreadyUsed for
        //    every redeemer but the first. The upserts above are
        //    idempotent, so a racing loser leaves no divergent state.
        let invite = self.invite_repo.mark_accepted(token).await?;

        info!(workspace_id = %invite.workspace_id, user_id = %user.id, "invite redeemed");

        Ok(InviteRedemption {
            workspace_id: invite.workspace_id,
            user_id: user.id,
        })
    }

    /// Revoke a pending invite by deleting its token record.
    /// Accepted invites are immutable history and cannot be revoked.
    pub async fn revoke(&self, token: &str) -> AuroraResult<()> {
        let invite = self.invite_repo.get_by_token(token).await?;
        if invite.accepted {
            return Err(AuroraError::InviteAlreadyUsed);
        }
        self.invite_repo.delete_by_token(token).await
    }

    /// Invites of a workspace, most recent first.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> AuroraResult<PaginatedResult<Invite>> {
        self.invite_repo
            .list_by_workspace(workspace_id, pagination)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_token_is_url_safe() {
        let token = generate_invite_token();
        // base64url characters only (A-Z a-z 0-9 - _), no padding.
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        // 32 bytes → 43 base64url chars.
        assert_eq!(token.len(), 43);
    }

    #[test]
    fn invite_tokens_are_unique() {
        assert_ne!(generate_invite_token(), generate_invite_token());
    }
}
