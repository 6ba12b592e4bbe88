//! SurrealDB implementation of [`PermissionRepository`].
//!
//! The (role, membership, module, action) tuple is unique. `grant` is
//! idempotent: an existing identical grant is returned as-is, and a
//! lost create race resolves to the winner's row.

use aurora_core::error::AuroraResult;
use aurora_core::models::permission::{
    ActionKey, CreatePermissionGrant, ModuleKey, PermissionGrant,
};
use aurora_core::repository::PermissionRepository;
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct GrantRowWithId {
    record_id: String,
    role_id: String,
    membership_id: Option<String>,
    module: String,
    action: String,
    created_at: Datetime,
}

impl GrantRowWithId {
    fn try_into_grant(self) -> Result<PermissionGrant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let role_id = Uuid::parse_str(&self.role_id)
            .map_err(|e| DbError::Query(format!("invalid role UUID: {e}")))?;
        let membership_id = self
            .membership_id
            .map(|m| Uuid::parse_str(&m))
            .transpose()
            .map_err(|e| DbError::Query(format!("invalid membership UUID: {e}")))?;
        let module = self
            .module
            .parse::<ModuleKey>()
            .map_err(|e| DbError::Query(e.to_string()))?;
        let action = self
            .action
            .parse::<ActionKey>()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(PermissionGrant {
            id,
            role_id,
            membership_id,
            module,
            action,
            created_at: self.created_at.0,
        })
    }
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_existing(
        &self,
        role_id: Uuid,
        membership_id: Option<Uuid>,
        module: ModuleKey,
        action: ActionKey,
    ) -> Result<Option<PermissionGrant>, DbError> {
        let membership_clause = match membership_id {
            Some(_) => "membership_id = $membership_id",
            None => "membership_id = NONE",
        };
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM permission \
             WHERE role_id = $role_id AND {membership_clause} \
             AND module = $module AND action = $action"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("role_id", role_id.to_string()))
            .bind(("module", module.as_str().to_string()))
            .bind(("action", action.as_str().to_string()));
        if let Some(membership_id) = membership_id {
            builder = builder.bind(("membership_id", membership_id.to_string()));
        }

        let mut result = builder.await?;
        let rows: Vec<GrantRowWithId> = result.take(0)?;

        rows.into_iter()
            .next()
            .map(|row| row.try_into_grant())
            .transpose()
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn grant(&self, input: CreatePermissionGrant) -> AuroraResult<PermissionGrant> {
        if let Some(existing) = self
            .find_existing(input.role_id, input.membership_id, input.module, input.action)
            .await?
        {
            return Ok(existing);
        }

        let id_str = Uuid::new_v4().to_string();
        let membership_clause = match input.membership_id {
            Some(_) => "membership_id = $membership_id",
            None => "membership_id = NONE",
        };
        let query = format!(
            "CREATE type::thing('permission', $id) SET \
             role_id = $role_id, {membership_clause}, \
             module = $module, action = $action \
             RETURN meta::id(id) AS record_id, *"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("role_id", input.role_id.to_string()))
            .bind(("module", input.module.as_str().to_string()))
            .bind(("action", input.action.as_str().to_string()));
        if let Some(membership_id) = input.membership_id {
            builder = builder.bind(("membership_id", membership_id.to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        match result.check() {
            Ok(mut result) => {
                let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;
                let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                    entity: "permission".into(),
                    id: id_str,
                })?;
                Ok(row.try_into_grant()?)
            }
            // Lost a create race; the identical tuple now exists.
            Err(_) => {
                let existing = self
                    .find_existing(input.role_id, input.membership_id, input.module, input.action)
                    .await?;
                Ok(existing.ok_or_else(|| DbError::NotFound {
                    entity: "permission".into(),
                    id: id_str,
                })?)
            }
        }
    }

    async fn revoke(
        &self,
        role_id: Uuid,
        membership_id: Option<Uuid>,
        module: ModuleKey,
        action: ActionKey,
    ) -> AuroraResult<()> {
        let membership_clause = match membership_id {
            Some(_) => "membership_id = $membership_id",
            None => "membership_id = NONE",
        };
        let query = format!(
            "DELETE permission \
             WHERE role_id = $role_id AND {membership_clause} \
             AND module = $module AND action = $action"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("role_id", role_id.to_string()))
            .bind(("module", module.as_str().to_string()))
            .bind(("action", action.as_str().to_string()));
        if let Some(membership_id) = membership_id {
            builder = builder.bind(("membership_id", membership_id.to_string()));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_for_role(&self, role_id: Uuid) -> AuroraResult<Vec<PermissionGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE role_id = $role_id \
                 ORDER BY created_at ASC",
            )
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_grant())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_for_membership(&self, membership_id: Uuid) -> AuroraResult<Vec<PermissionGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE membership_id = $membership_id \
                 ORDER BY created_at ASC",
            )
            .bind(("membership_id", membership_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_grant())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
