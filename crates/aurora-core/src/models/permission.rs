//! Permission vocabulary and grant model.
//!
//! Modules and actions are fixed closed sets. Any combination outside
//! them is a configuration error caught at the boundary via
//! [`FromStr`], never a runtime concern for the evaluator.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuroraError;

/// The ten CRM modules permissions are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKey {
    Leads,
    Contacts,
    Accounts,
    Deals,
    Campaigns,
    Messaging,
    Calls,
    Ai,
    Automations,
    Settings,
}

impl ModuleKey {
    pub const ALL: [ModuleKey; 10] = [
        ModuleKey::Leads,
        ModuleKey::Contacts,
        ModuleKey::Accounts,
        ModuleKey::Deals,
        ModuleKey::Campaigns,
        ModuleKey::Messaging,
        ModuleKey::Calls,
        ModuleKey::Ai,
        ModuleKey::Automations,
        ModuleKey::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::Leads => "leads",
            ModuleKey::Contacts => "contacts",
            ModuleKey::Accounts => "accounts",
            ModuleKey::Deals => "deals",
            ModuleKey::Campaigns => "campaigns",
            ModuleKey::Messaging => "messaging",
            ModuleKey::Calls => "calls",
            ModuleKey::Ai => "ai",
            ModuleKey::Automations => "automations",
            ModuleKey::Settings => "settings",
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKey {
    type Err = AuroraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AuroraError::Validation {
                message: format!("unknown module: {s}"),
            })
    }
}

/// The four actions a grant can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKey {
    View,
    Create,
    Edit,
    Delete,
}

impl ActionKey {
    pub const ALL: [ActionKey; 4] = [
        ActionKey::View,
        ActionKey::Create,
        ActionKey::Edit,
        ActionKey::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKey::View => "view",
            ActionKey::Create => "create",
            ActionKey::Edit => "edit",
            ActionKey::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKey {
    type Err = AuroraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AuroraError::Validation {
                message: format!("unknown action: {s}"),
            })
    }
}

/// A (module, action) grant.
///
/// Always traceable to exactly one role via `role_id`. When
/// `membership_id` is also set, the grant applies directly to that
/// membership, independent of which role the membership uses — this
/// is how an admin overrides a single user's access without forking a
/// whole role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub id: Uuid,
    pub role_id: Uuid,
    pub membership_id: Option<Uuid>,
    pub module: ModuleKey,
    pub action: ActionKey,
    pub created_at: DateTime<Utc>,
}

impl PermissionGrant {
    pub fn matches(&self, module: ModuleKey, action: ActionKey) -> bool {
        self.module == module && self.action == action
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermissionGrant {
    pub role_id: Uuid,
    pub membership_id: Option<Uuid>,
    pub module: ModuleKey,
    pub action: ActionKey,
}
