//! Workspace domain model.
//!
//! A workspace is the tenant root: every CRM entity, role, membership,
//! and invite hangs off exactly one workspace. Workspaces are never
//! physically deleted except by an explicit platform-admin delete,
//! which cascades to all tenant-owned data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Basic,
    Pro,
    Premium,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic => "basic",
            PlanTier::Pro => "pro",
            PlanTier::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Primary domain (e.g., `acme.crm.example`). Globally unique.
    pub domain: String,
    pub plan: PlanTier,
    pub enable_ai: bool,
    pub enable_calls: bool,
    pub enable_whatsapp: bool,
    pub enable_automations: bool,
    pub enable_campaigns: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new workspace.
///
/// Creation also registers the primary domain as an active
/// [`WorkspaceDomain`] mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspace {
    pub name: String,
    pub domain: String,
    pub plan: PlanTier,
    pub enable_ai: bool,
    pub enable_calls: bool,
    pub enable_whatsapp: bool,
    pub enable_automations: bool,
    pub enable_campaigns: bool,
}

impl Default for CreateWorkspace {
    fn default() -> Self {
        Self {
            name: String::new(),
            domain: String::new(),
            plan: PlanTier::Basic,
            enable_ai: true,
            enable_calls: true,
            enable_whatsapp: true,
            enable_automations: true,
            enable_campaigns: true,
        }
    }
}

/// Fields that can be updated on an existing workspace.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateWorkspace {
    pub name: Option<String>,
    pub plan: Option<PlanTier>,
    pub enable_ai: Option<bool>,
    pub enable_calls: Option<bool>,
    pub enable_whatsapp: Option<bool>,
    pub enable_automations: Option<bool>,
    pub enable_campaigns: Option<bool>,
}

/// A domain string owned by exactly one workspace, used to map an
/// inbound host to a tenant. A workspace may own several domains
/// (alias support) but a domain string is globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceDomain {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub domain: String,
    /// Inactive mappings behave as if they do not exist.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceDomain {
    pub workspace_id: Uuid,
    pub domain: String,
    pub active: bool,
}

/// The five feature flags of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFeatures {
    pub ai: bool,
    pub calls: bool,
    pub whatsapp: bool,
    pub automations: bool,
    pub campaigns: bool,
}

impl WorkspaceFeatures {
    /// Default-enabled set, used when the persistence layer cannot be
    /// read. Callers must make that degradation visible in telemetry.
    pub fn all_enabled() -> Self {
        Self {
            ai: true,
            calls: true,
            whatsapp: true,
            automations: true,
            campaigns: true,
        }
    }

    pub fn is_enabled(&self, feature: FeatureKey) -> bool {
        match feature {
            FeatureKey::Ai => self.ai,
            FeatureKey::Calls => self.calls,
            FeatureKey::Whatsapp => self.whatsapp,
            FeatureKey::Automations => self.automations,
            FeatureKey::Campaigns => self.campaigns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKey {
    Ai,
    Calls,
    Whatsapp,
    Automations,
    Campaigns,
}
