//! Workspace resolution — binding an inbound request to exactly one
//! tenant.
//!
//! Resolution order, first match wins: explicit session selection,
//! active domain mapping for the request host, configured fallback
//! demo workspace. There is no "no workspace" success state for
//! tenant-scoped endpoints.

use aurora_core::error::{AuroraError, AuroraResult};
use aurora_core::models::workspace::{FeatureKey, Workspace, WorkspaceFeatures};
use aurora_core::repository::{WorkspaceDomainRepository, WorkspaceRepository};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AccessConfig;

/// The slice of an inbound request the resolver needs.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Workspace previously selected by the caller, carried via a
    /// session-scoped identifier (cookie or equivalent).
    pub selected_workspace_id: Option<Uuid>,
    /// Raw `Host` header value, port included.
    pub host: Option<String>,
}

impl RequestContext {
    /// Host with any `:port` suffix stripped.
    fn domain(&self) -> Option<&str> {
        self.host
            .as_deref()
            .map(|h| h.split(':').next().unwrap_or(h))
            .filter(|d| !d.is_empty())
    }
}

/// Read-only workspace resolver. Resolution has no side effects.
pub struct WorkspaceResolver<W, D>
where
    W: WorkspaceRepository,
    D: WorkspaceDomainRepository,
{
    workspace_repo: W,
    domain_repo: D,
    config: AccessConfig,
}

impl<W, D> WorkspaceResolver<W, D>
where
    W: WorkspaceRepository,
    D: WorkspaceDomainRepository,
{
    pub fn new(workspace_repo: W, domain_repo: D, config: AccessConfig) -> Self {
        Self {
            workspace_repo,
            domain_repo,
            config,
        }
    }

    /// Resolve the active workspace for a request, or fail with
    /// `NoActiveWorkspace`. The failure is a hard stop (500-class at
    /// the boundary): it typically means missing seed data, not a
    /// retryable condition.
    ///
    /// A persistence error inside one strategy falls through to the
    /// next so that a transient read problem on, say, the cookie
    /// lookup cannot mask a perfectly resolvable domain mapping.
    pub async fn resolve(&self, ctx: &RequestContext) -> AuroraResult<Workspace> {
        // 1. Explicit selection, if that workspace still exists.
        if let Some(selected) = ctx.selected_workspace_id {
            match self.workspace_repo.get_by_id(selected).await {
                Ok(ws) => return Ok(ws),
                Err(AuroraError::NotFound { .. }) => {
                    debug!(%selected, "selected workspace no longer exists");
                }
                Err(e) => warn!(error = %e, "workspace selection lookup failed"),
            }
        }

        // 2. Active domain mapping for the request host.
        if let Some(domain) = ctx.domain() {
            match self.domain_repo.get_by_domain(domain).await {
                Ok(mapping) if mapping.active => {
                    match self.workspace_repo.get_by_id(mapping.workspace_id).await {
                        Ok(ws) => return Ok(ws),
                        Err(AuroraError::NotFound { .. }) => {
                            debug!(%domain, "domain maps to a missing workspace");
                        }
                        Err(e) => warn!(error = %e, "domain-mapped workspace lookup failed"),
                    }
                }
                // Inactive mappings behave as if there is no mapping.
                Ok(_) => debug!(%domain, "domain mapping is inactive"),
                Err(AuroraError::NotFound { .. }) => {}
                Err(e) => warn!(error = %e, "domain mapping lookup failed"),
            }
        }

        // 3. Fallback demo workspace.
        match self
            .workspace_repo
            .get_by_primary_domain(&self.config.fallback_workspace_domain)
            .await
        {
            Ok(ws) => Ok(ws),
            Err(AuroraError::NotFound { .. }) => Err(AuroraError::NoActiveWorkspace),
            Err(e) => {
                warn!(error = %e, "fallback workspace lookup failed");
                Err(AuroraError::NoActiveWorkspace)
            }
        }
    }

    /// Resolve and return just the workspace id.
    pub async fn require_workspace_id(&self, ctx: &RequestContext) -> AuroraResult<Uuid> {
        Ok(self.resolve(ctx).await?.id)
    }

    /// Feature flags for a resolved workspace.
    ///
    /// Degrades to the default-enabled set when the persistence layer
    /// is unreachable or the schema is stale. The degradation is
    /// deliberate policy, not silent data loss — the `degraded` field
    /// on the warning keeps it distinguishable from a real
    /// all-enabled read.
    pub async fn features(&self, workspace_id: Uuid) -> AuroraResult<WorkspaceFeatures> {
        match self.workspace_repo.get_features(workspace_id).await {
            Ok(features) => Ok(features),
            Err(AuroraError::Database(reason)) => {
                warn!(%workspace_id, %reason, degraded = true, "feature flag read failed, serving defaults");
                Ok(WorkspaceFeatures::all_enabled())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a single feature is enabled for a workspace.
    pub async fn ensure_feature_enabled(
        &self,
        workspace_id: Uuid,
        feature: FeatureKey,
    ) -> AuroraResult<bool> {
        Ok(self.features(workspace_id).await?.is_enabled(feature))
    }
}
