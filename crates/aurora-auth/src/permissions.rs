//! Permission evaluation — the guard consulted before every
//! sensitive tenant-data read or mutation.
//!
//! Evaluation layers, in strict order and short-circuiting on first
//! success: superadmin bypass, direct membership grants, role-defined
//! grants, built-in role defaults. Layering direct → role-custom →
//! role-default lets an admin override a single user's access without
//! forking a whole role, while every role keeps a sane default before
//! any custom grants exist.

use aurora_core::error::{AuroraError, AuroraResult};
use aurora_core::models::permission::{ActionKey, ModuleKey};
use aurora_core::models::role::Role;
use aurora_core::repository::{
    MembershipRepository, PermissionRepository, RoleRepository, UserRepository,
};
use tracing::debug;
use uuid::Uuid;

use crate::config::AccessConfig;

/// The authenticated identity of a request, as supplied by the
/// identity provider at the boundary.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Role key used when neither a workspace role nor a legacy global
/// role can be determined.
const FALLBACK_ROLE_KEY: &str = "seller";

const ALL_ACTIONS: &[ActionKey] = &[
    ActionKey::View,
    ActionKey::Create,
    ActionKey::Edit,
    ActionKey::Delete,
];
const VIEW_CREATE_EDIT: &[ActionKey] = &[ActionKey::View, ActionKey::Create, ActionKey::Edit];
const VIEW_CREATE: &[ActionKey] = &[ActionKey::View, ActionKey::Create];
const VIEW_ONLY: &[ActionKey] = &[ActionKey::View];

/// Built-in default action set for a (role key, module) pair.
///
/// Unknown role keys (custom roles, legacy `manager`/`sales`) have no
/// defaults — they only get what their explicit grants give them.
pub fn builtin_role_actions(role_key: &str, module: ModuleKey) -> &'static [ActionKey] {
    match role_key {
        "owner" | "admin" => ALL_ACTIONS,
        "seller" => match module {
            ModuleKey::Leads | ModuleKey::Contacts | ModuleKey::Deals | ModuleKey::Messaging => {
                VIEW_CREATE_EDIT
            }
            ModuleKey::Calls => VIEW_CREATE,
            _ => VIEW_ONLY,
        },
        "marketing" => match module {
            ModuleKey::Campaigns | ModuleKey::Messaging => VIEW_CREATE_EDIT,
            _ => VIEW_ONLY,
        },
        "readonly" => VIEW_ONLY,
        _ => &[],
    }
}

/// Permission evaluator.
///
/// Generic over repository implementations so that the evaluation
/// logic has no dependency on the database crate. A pure read path:
/// safe under unbounded concurrency.
pub struct PermissionService<M, U, R, P>
where
    M: MembershipRepository,
    U: UserRepository,
    R: RoleRepository,
    P: PermissionRepository,
{
    membership_repo: M,
    user_repo: U,
    role_repo: R,
    permission_repo: P,
    config: AccessConfig,
}

impl<M, U, R, P> PermissionService<M, U, R, P>
where
    M: MembershipRepository,
    U: UserRepository,
    R: RoleRepository,
    P: PermissionRepository,
{
    pub fn new(
        membership_repo: M,
        user_repo: U,
        role_repo: R,
        permission_repo: P,
        config: AccessConfig,
    ) -> Self {
        Self {
            membership_repo,
            user_repo,
            role_repo,
            permission_repo,
            config,
        }
    }

    /// Whether an email matches the configured superadmin
    /// (case-insensitive). Unconfigured means nobody matches.
    pub fn is_superadmin(&self, email: &str) -> bool {
        match &self.config.superadmin_email {
            Some(configured) => configured.eq_ignore_ascii_case(email),
            None => false,
        }
    }

    /// Decide whether `identity` may perform `action` on `module`
    /// within `workspace_id`.
    ///
    /// `Err(Unauthorized)` when there is no identity,
    /// `Err(Forbidden)` when every grant layer denies — including
    /// when the identity holds no membership in the target workspace:
    /// cross-tenant access is never implicit.
    pub async fn can_perform(
        &self,
        identity: Option<&Identity>,
        workspace_id: Uuid,
        module: ModuleKey,
        action: ActionKey,
    ) -> AuroraResult<()> {
        // 1. Superadmin bypass, ignoring membership entirely.
        if let Some(id) = identity {
            if self.is_superadmin(&id.email) {
                return Ok(());
            }
        }

        // 2. Identity requirement.
        let identity = identity.ok_or(AuroraError::Unauthorized)?;

        // 3. Membership lookup. No membership means no access.
        let membership = match self
            .membership_repo
            .get(identity.user_id, workspace_id)
            .await
        {
            Ok(m) => m,
            Err(AuroraError::NotFound { .. }) => {
                debug!(user_id = %identity.user_id, %workspace_id, "no membership in workspace");
                return Err(AuroraError::Forbidden);
            }
            Err(e) => return Err(e),
        };

        // 4. Direct grants on the membership.
        let direct = self
            .permission_repo
            .list_for_membership(membership.id)
            .await?;
        if direct.iter().any(|g| g.matches(module, action)) {
            return Ok(());
        }

        // 5. Role-defined grants. A dangling role reference (role was
        //    deleted) counts as "no role".
        let role = match membership.role_id {
            Some(role_id) => match self.role_repo.get_by_id(role_id).await {
                Ok(r) => Some(r),
                Err(AuroraError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        if let Some(role) = &role {
            let custom = self.permission_repo.list_for_role(role.id).await?;
            if custom.iter().any(|g| g.matches(module, action)) {
                return Ok(());
            }
        }

        // 6. Built-in role defaults, keyed by workspace role name,
        //    then the user's legacy global role, then the fallback.
        let role_key = self.evaluation_role_key(role.as_ref(), identity.user_id).await?;
        if builtin_role_actions(&role_key, module).contains(&action) {
            return Ok(());
        }

        debug!(
            user_id = %identity.user_id,
            %workspace_id,
            %module,
            %action,
            "permission denied"
        );
        Err(AuroraError::Forbidden)
    }

    async fn evaluation_role_key(&self, role: Option<&Role>, user_id: Uuid) -> AuroraResult<String> {
        if let Some(role) = role {
            return Ok(role.name.to_lowercase());
        }
        match self.user_repo.get_by_id(user_id).await {
            Ok(user) => Ok(user.role.as_str().to_string()),
            Err(AuroraError::NotFound { .. }) => Ok(FALLBACK_ROLE_KEY.to_string()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(role_key: &str, module: ModuleKey, action: ActionKey) -> bool {
        builtin_role_actions(role_key, module).contains(&action)
    }

    #[test]
    fn owner_and_admin_allow_everything() {
        for module in ModuleKey::ALL {
            for action in ActionKey::ALL {
                assert!(allowed("owner", module, action));
                assert!(allowed("admin", module, action));
            }
        }
    }

    #[test]
    fn readonly_is_view_only() {
        for module in ModuleKey::ALL {
            assert!(allowed("readonly", module, ActionKey::View));
            assert!(!allowed("readonly", module, ActionKey::Create));
            assert!(!allowed("readonly", module, ActionKey::Edit));
            assert!(!allowed("readonly", module, ActionKey::Delete));
        }
    }

    #[test]
    fn seller_cannot_delete_anywhere() {
        for module in ModuleKey::ALL {
            assert!(!allowed("seller", module, ActionKey::Delete));
        }
    }

    #[test]
    fn seller_edits_pipeline_modules_only() {
        assert!(allowed("seller", ModuleKey::Leads, ActionKey::Edit));
        assert!(allowed("seller", ModuleKey::Deals, ActionKey::Edit));
        assert!(allowed("seller", ModuleKey::Messaging, ActionKey::Edit));
        assert!(allowed("seller", ModuleKey::Calls, ActionKey::Create));
        assert!(!allowed("seller", ModuleKey::Calls, ActionKey::Edit));
        assert!(!allowed("seller", ModuleKey::Accounts, ActionKey::Create));
        assert!(!allowed("seller", ModuleKey::Settings, ActionKey::Edit));
    }

    #[test]
    fn marketing_owns_campaigns_and_messaging() {
        assert!(allowed("marketing", ModuleKey::Campaigns, ActionKey::Edit));
        assert!(allowed("marketing", ModuleKey::Messaging, ActionKey::Create));
        assert!(!allowed("marketing", ModuleKey::Leads, ActionKey::Create));
        assert!(!allowed("marketing", ModuleKey::Campaigns, ActionKey::Delete));
    }

    /// Built-in defaults form supersets in the order
    /// owner/admin ⊇ seller ⊇ readonly (and ⊇ marketing).
    #[test]
    fn defaults_are_ordered_supersets() {
        for module in ModuleKey::ALL {
            for action in ActionKey::ALL {
                if allowed("readonly", module, action) {
                    assert!(allowed("seller", module, action));
                    assert!(allowed("marketing", module, action));
                }
                if allowed("seller", module, action) || allowed("marketing", module, action) {
                    assert!(allowed("owner", module, action));
                    assert!(allowed("admin", module, action));
                }
            }
        }
    }

    #[test]
    fn unknown_role_keys_have_no_defaults() {
        for module in ModuleKey::ALL {
            assert!(builtin_role_actions("manager", module).is_empty());
            assert!(builtin_role_actions("sales", module).is_empty());
            assert!(builtin_role_actions("custom-support", module).is_empty());
        }
    }
}
