//! Aurora Auth — tenancy and access-control services: permission
//! evaluation, workspace resolution, invite lifecycle, and request
//! rate limiting.

pub mod config;
pub mod invites;
pub mod password;
pub mod permissions;
pub mod ratelimit;
pub mod workspace;

pub use config::AccessConfig;
pub use invites::{CreateInviteRequest, CreatedInvite, InviteService};
pub use permissions::{Identity, PermissionService};
pub use ratelimit::RateLimiter;
pub use workspace::{RequestContext, WorkspaceResolver};
