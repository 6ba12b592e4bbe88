//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The core assumes the
//! uniqueness constraints of the data model (workspace domains, user
//! emails, (user, workspace) membership pairs, invite tokens) are
//! enforced by the implementation.

use uuid::Uuid;

use crate::error::AuroraResult;
use crate::models::{
    invite::{CreateInvite, Invite},
    membership::{CreateMembership, Membership},
    permission::{ActionKey, CreatePermissionGrant, ModuleKey, PermissionGrant},
    role::{CreateRole, Role, UpdateRole},
    user::{CreateUser, UpdateUser, User},
    workspace::{
        CreateWorkspace, CreateWorkspaceDomain, UpdateWorkspace, Workspace, WorkspaceDomain,
        WorkspaceFeatures,
    },
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Workspaces (global scope)
// ---------------------------------------------------------------------------

pub trait WorkspaceRepository: Send + Sync {
    /// Create a workspace. Also registers the primary domain as an
    /// active domain mapping.
    fn create(&self, input: CreateWorkspace) -> impl Future<Output = AuroraResult<Workspace>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AuroraResult<Workspace>> + Send;
    /// Look up a workspace by its *primary* domain attribute.
    fn get_by_primary_domain(
        &self,
        domain: &str,
    ) -> impl Future<Output = AuroraResult<Workspace>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateWorkspace,
    ) -> impl Future<Output = AuroraResult<Workspace>> + Send;
    /// Hard delete. Cascades to domains, roles, grants, memberships,
    /// and invites of the workspace.
    fn delete(&self, id: Uuid) -> impl Future<Output = AuroraResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = AuroraResult<PaginatedResult<Workspace>>> + Send;
    /// Read only the feature flags of a workspace.
    fn get_features(
        &self,
        id: Uuid,
    ) -> impl Future<Output = AuroraResult<WorkspaceFeatures>> + Send;
}

pub trait WorkspaceDomainRepository: Send + Sync {
    fn create(
        &self,
        input: CreateWorkspaceDomain,
    ) -> impl Future<Output = AuroraResult<WorkspaceDomain>> + Send;
    /// Exact-match lookup; the caller decides how to treat inactive
    /// mappings.
    fn get_by_domain(
        &self,
        domain: &str,
    ) -> impl Future<Output = AuroraResult<WorkspaceDomain>> + Send;
    fn list_by_workspace(
        &self,
        workspace_id: Uuid,
    ) -> impl Future<Output = AuroraResult<Vec<WorkspaceDomain>>> + Send;
    fn set_active(
        &self,
        domain: &str,
        active: bool,
    ) -> impl Future<Output = AuroraResult<WorkspaceDomain>> + Send;
}

// ---------------------------------------------------------------------------
// Users (global scope)
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = AuroraResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AuroraResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = AuroraResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = AuroraResult<User>> + Send;
}

// ---------------------------------------------------------------------------
// Workspace-scoped repositories
// ---------------------------------------------------------------------------

pub trait MembershipRepository: Send + Sync {
    /// Fetch the membership for a (user, workspace) pair. `NotFound`
    /// when the user is not a member of that workspace.
    fn get(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
    ) -> impl Future<Output = AuroraResult<Membership>> + Send;
    /// Create the membership, or update its role if the pair already
    /// exists. Idempotent under concurrent calls with the same input.
    fn upsert(
        &self,
        input: CreateMembership,
    ) -> impl Future<Output = AuroraResult<Membership>> + Send;
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = AuroraResult<Vec<Membership>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = AuroraResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AuroraResult<Role>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = AuroraResult<Role>> + Send;
    /// Deletes the role and its grants. Memberships referencing the
    /// role are left dangling on purpose.
    fn delete(&self, id: Uuid) -> impl Future<Output = AuroraResult<()>> + Send;
    fn list_by_workspace(
        &self,
        workspace_id: Uuid,
    ) -> impl Future<Output = AuroraResult<Vec<Role>>> + Send;
}

pub trait PermissionRepository: Send + Sync {
    /// Record a grant. Duplicates of the same
    /// (role, membership, module, action) tuple are idempotent: the
    /// existing grant is returned.
    fn grant(
        &self,
        input: CreatePermissionGrant,
    ) -> impl Future<Output = AuroraResult<PermissionGrant>> + Send;
    fn revoke(
        &self,
        role_id: Uuid,
        membership_id: Option<Uuid>,
        module: ModuleKey,
        action: ActionKey,
    ) -> impl Future<Output = AuroraResult<()>> + Send;
    /// All grants attached to a role (including ones that are also
    /// directly attached to a membership).
    fn list_for_role(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = AuroraResult<Vec<PermissionGrant>>> + Send;
    /// Grants attached directly to a specific membership.
    fn list_for_membership(
        &self,
        membership_id: Uuid,
    ) -> impl Future<Output = AuroraResult<Vec<PermissionGrant>>> + Send;
}

pub trait InviteRepository: Send + Sync {
    fn create(&self, input: CreateInvite) -> impl Future<Output = AuroraResult<Invite>> + Send;
    fn get_by_token(&self, token: &str) -> impl Future<Output = AuroraResult<Invite>> + Send;
    fn list_by_workspace(
        &self,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = AuroraResult<PaginatedResult<Invite>>> + Send;
    /// Atomically flip `accepted` from false to true and return the
    /// updated invite. Fails with `InviteAlreadyUsed` if the flag was
    /// already set, and `NotFound` if the token does not exist. This
    /// compare-and-set is the transaction boundary of redemption:
    /// concurrent redeemers race safely because at most one call
    /// observes the false → true transition.
    fn mark_accepted(&self, token: &str) -> impl Future<Output = AuroraResult<Invite>> + Send;
    fn delete_by_token(&self, token: &str) -> impl Future<Output = AuroraResult<()>> + Send;
}
