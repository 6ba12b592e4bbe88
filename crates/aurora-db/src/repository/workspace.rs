//! SurrealDB implementations of [`WorkspaceRepository`] and
//! [`WorkspaceDomainRepository`].
//!
//! Workspace creation also registers the primary domain as an active
//! domain mapping, so host-based resolution works for a fresh tenant
//! without a separate setup step.

use aurora_core::error::AuroraResult;
use aurora_core::models::workspace::{
    CreateWorkspace, CreateWorkspaceDomain, PlanTier, UpdateWorkspace, Workspace, WorkspaceDomain,
    WorkspaceFeatures,
};
use aurora_core::repository::{
    PaginatedResult, Pagination, WorkspaceDomainRepository, WorkspaceRepository,
};
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::sql::statements::{BeginStatement, CommitStatement};
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{check_transaction, write_error};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct WorkspaceRow {
    name: String,
    domain: String,
    plan: String,
    enable_ai: bool,
    enable_calls: bool,
    enable_whatsapp: bool,
    enable_automations: bool,
    enable_campaigns: bool,
    created_at: Datetime,
    updated_at: Datetime,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct WorkspaceRowWithId {
    record_id: String,
    name: String,
    domain: String,
    plan: String,
    enable_ai: bool,
    enable_calls: bool,
    enable_whatsapp: bool,
    enable_automations: bool,
    enable_campaigns: bool,
    created_at: Datetime,
    updated_at: Datetime,
}

fn parse_plan(s: &str) -> Result<PlanTier, DbError> {
    match s {
        "basic" => Ok(PlanTier::Basic),
        "pro" => Ok(PlanTier::Pro),
        "premium" => Ok(PlanTier::Premium),
        other => Err(DbError::Query(format!("unknown plan tier: {other}"))),
    }
}

impl WorkspaceRow {
    fn into_workspace(self, id: Uuid) -> Result<Workspace, DbError> {
        Ok(Workspace {
            id,
            name: self.name,
            domain: self.domain,
            plan: parse_plan(&self.plan)?,
            enable_ai: self.enable_ai,
            enable_calls: self.enable_calls,
            enable_whatsapp: self.enable_whatsapp,
            enable_automations: self.enable_automations,
            enable_campaigns: self.enable_campaigns,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

impl WorkspaceRowWithId {
    fn try_into_workspace(self) -> Result<Workspace, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Workspace {
            id,
            name: self.name,
            domain: self.domain,
            plan: parse_plan(&self.plan)?,
            enable_ai: self.enable_ai,
            enable_calls: self.enable_calls,
            enable_whatsapp: self.enable_whatsapp,
            enable_automations: self.enable_automations,
            enable_campaigns: self.enable_campaigns,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FeaturesRow {
    enable_ai: bool,
    enable_calls: bool,
    enable_whatsapp: bool,
    enable_automations: bool,
    enable_campaigns: bool,
}

/// Row struct for count queries.
#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Workspace repository.
#[derive(Clone)]
pub struct SurrealWorkspaceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkspaceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> WorkspaceRepository for SurrealWorkspaceRepository<C> {
    async fn create(&self, input: CreateWorkspace) -> AuroraResult<Workspace> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let domain_mapping_id = Uuid::new_v4().to_string();

        // One transaction: a domain collision on the mapping must not
        // leave an orphan workspace row behind.
        let result = self
            .db
            .query(BeginStatement::default())
            .query(
                "CREATE type::thing('workspace', $id) SET \
                 name = $name, domain = $domain, plan = $plan, \
                 enable_ai = $enable_ai, enable_calls = $enable_calls, \
                 enable_whatsapp = $enable_whatsapp, \
                 enable_automations = $enable_automations, \
                 enable_campaigns = $enable_campaigns",
            )
            .query(
                "CREATE type::thing('workspace_domain', $domain_mapping_id) SET \
                 workspace_id = $id, domain = $domain, active = true",
            )
            .query(CommitStatement::default())
            .bind(("id", id_str.clone()))
            .bind(("domain_mapping_id", domain_mapping_id))
            .bind(("name", input.name))
            .bind(("domain", input.domain))
            .bind(("plan", input.plan.as_str().to_string()))
            .bind(("enable_ai", input.enable_ai))
            .bind(("enable_calls", input.enable_calls))
            .bind(("enable_whatsapp", input.enable_whatsapp))
            .bind(("enable_automations", input.enable_automations))
            .bind(("enable_campaigns", input.enable_campaigns))
            .await
            .map_err(DbError::from)?;

        let mut result = check_transaction("workspace", result)?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: id_str,
        })?;

        Ok(row.into_workspace(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> AuroraResult<Workspace> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('workspace', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: id_str,
        })?;

        Ok(row.into_workspace(id)?)
    }

    async fn get_by_primary_domain(&self, domain: &str) -> AuroraResult<Workspace> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workspace \
                 WHERE domain = $domain",
            )
            .bind(("domain", domain.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkspaceRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: format!("domain={domain}"),
        })?;

        Ok(row.try_into_workspace()?)
    }

    async fn update(&self, id: Uuid, input: UpdateWorkspace) -> AuroraResult<Workspace> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.plan.is_some() {
            sets.push("plan = $plan");
        }
        if input.enable_ai.is_some() {
            sets.push("enable_ai = $enable_ai");
        }
        if input.enable_calls.is_some() {
            sets.push("enable_calls = $enable_calls");
        }
        if input.enable_whatsapp.is_some() {
            sets.push("enable_whatsapp = $enable_whatsapp");
        }
        if input.enable_automations.is_some() {
            sets.push("enable_automations = $enable_automations");
        }
        if input.enable_campaigns.is_some() {
            sets.push("enable_campaigns = $enable_campaigns");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::thing('workspace', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(plan) = input.plan {
            builder = builder.bind(("plan", plan.as_str().to_string()));
        }
        if let Some(enable_ai) = input.enable_ai {
            builder = builder.bind(("enable_ai", enable_ai));
        }
        if let Some(enable_calls) = input.enable_calls {
            builder = builder.bind(("enable_calls", enable_calls));
        }
        if let Some(enable_whatsapp) = input.enable_whatsapp {
            builder = builder.bind(("enable_whatsapp", enable_whatsapp));
        }
        if let Some(enable_automations) = input.enable_automations {
            builder = builder.bind(("enable_automations", enable_automations));
        }
        if let Some(enable_campaigns) = input.enable_campaigns {
            builder = builder.bind(("enable_campaigns", enable_campaigns));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: id_str,
        })?;

        Ok(row.into_workspace(id)?)
    }

    async fn delete(&self, id: Uuid) -> AuroraResult<()> {
        let id_str = id.to_string();

        self.db
            .query(
                "DELETE permission WHERE role_id IN \
                 (SELECT VALUE meta::id(id) FROM role WHERE workspace_id = $id)",
            )
            .query("DELETE role WHERE workspace_id = $id")
            .query("DELETE membership WHERE workspace_id = $id")
            .query("DELETE invite WHERE workspace_id = $id")
            .query("DELETE workspace_domain WHERE workspace_id = $id")
            .query("DELETE type::thing('workspace', $id)")
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> AuroraResult<PaginatedResult<Workspace>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM workspace GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workspace \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkspaceRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_workspace())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_features(&self, id: Uuid) -> AuroraResult<WorkspaceFeatures> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT enable_ai, enable_calls, enable_whatsapp, \
                 enable_automations, enable_campaigns \
                 FROM type::thing('workspace', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeaturesRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: id_str,
        })?;

        Ok(WorkspaceFeatures {
            ai: row.enable_ai,
            calls: row.enable_calls,
            whatsapp: row.enable_whatsapp,
            automations: row.enable_automations,
            campaigns: row.enable_campaigns,
        })
    }
}

// ---------------------------------------------------------------------------
// Workspace domains
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DomainRow {
    workspace_id: String,
    domain: String,
    active: bool,
    created_at: Datetime,
}

#[derive(Debug, Deserialize)]
struct DomainRowWithId {
    record_id: String,
    workspace_id: String,
    domain: String,
    active: bool,
    created_at: Datetime,
}

impl DomainRow {
    fn into_domain(self, id: Uuid) -> Result<WorkspaceDomain, DbError> {
        let workspace_id = Uuid::parse_str(&self.workspace_id)
            .map_err(|e| DbError::Query(format!("invalid workspace UUID: {e}")))?;
        Ok(WorkspaceDomain {
            id,
            workspace_id,
            domain: self.domain,
            active: self.active,
            created_at: self.created_at.0,
        })
    }
}

impl DomainRowWithId {
    fn try_into_domain(self) -> Result<WorkspaceDomain, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let workspace_id = Uuid::parse_str(&self.workspace_id)
            .map_err(|e| DbError::Query(format!("invalid workspace UUID: {e}")))?;
        Ok(WorkspaceDomain {
            id,
            workspace_id,
            domain: self.domain,
            active: self.active,
            created_at: self.created_at.0,
        })
    }
}

/// SurrealDB implementation of the WorkspaceDomain repository.
#[derive(Clone)]
pub struct SurrealWorkspaceDomainRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkspaceDomainRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> WorkspaceDomainRepository for SurrealWorkspaceDomainRepository<C> {
    async fn create(&self, input: CreateWorkspaceDomain) -> AuroraResult<WorkspaceDomain> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('workspace_domain', $id) SET \
                 workspace_id = $workspace_id, domain = $domain, \
                 active = $active",
            )
            .bind(("id", id_str.clone()))
            .bind(("workspace_id", input.workspace_id.to_string()))
            .bind(("domain", input.domain))
            .bind(("active", input.active))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| write_error("workspace_domain", e))?;

        let rows: Vec<DomainRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace_domain".into(),
            id: id_str,
        })?;

        Ok(row.into_domain(id)?)
    }

    async fn get_by_domain(&self, domain: &str) -> AuroraResult<WorkspaceDomain> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workspace_domain \
                 WHERE domain = $domain",
            )
            .bind(("domain", domain.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DomainRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace_domain".into(),
            id: format!("domain={domain}"),
        })?;

        Ok(row.try_into_domain()?)
    }

    async fn list_by_workspace(&self, workspace_id: Uuid) -> AuroraResult<Vec<WorkspaceDomain>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workspace_domain \
                 WHERE workspace_id = $workspace_id \
                 ORDER BY created_at ASC",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DomainRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_domain())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn set_active(&self, domain: &str, active: bool) -> AuroraResult<WorkspaceDomain> {
        let mut result = self
            .db
            .query(
                "UPDATE workspace_domain SET active = $active \
                 WHERE domain = $domain \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("domain", domain.to_string()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DomainRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace_domain".into(),
            id: format!("domain={domain}"),
        })?;

        Ok(row.try_into_domain()?)
    }
}
