//! SurrealDB repository implementations.

mod invite;
mod membership;
mod permission;
mod role;
mod user;
mod workspace;

pub use invite::SurrealInviteRepository;
pub use membership::SurrealMembershipRepository;
pub use permission::SurrealPermissionRepository;
pub use role::SurrealRoleRepository;
pub use user::SurrealUserRepository;
pub use workspace::{SurrealWorkspaceDomainRepository, SurrealWorkspaceRepository};

use aurora_core::error::AuroraError;

/// Map a write error to `AlreadyExists` when it is a unique index
/// violation, `Database` otherwise.
pub(crate) fn write_error(entity: &str, err: surrealdb::Error) -> AuroraError {
    let message = err.to_string();
    if message.contains("already contains") {
        AuroraError::AlreadyExists {
            entity: entity.to_string(),
        }
    } else {
        AuroraError::Database(message)
    }
}

/// Drain every statement error from a multi-statement response,
/// mapping unique index violations to `AlreadyExists`.
///
/// Needed for transactional writes: when a transaction is cancelled,
/// the statements before the failing one report only a generic
/// "not executed" error, so the violation has to be searched for
/// across all statement results rather than taken from the first.
pub(crate) fn check_transaction(
    entity: &str,
    mut response: surrealdb::Response,
) -> Result<surrealdb::Response, AuroraError> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return Ok(response);
    }
    if errors
        .values()
        .any(|e| e.to_string().contains("already contains"))
    {
        return Err(AuroraError::AlreadyExists {
            entity: entity.to_string(),
        });
    }
    let message = errors
        .into_values()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Err(AuroraError::Database(message))
}
