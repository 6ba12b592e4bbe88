//! SurrealDB implementation of [`RoleRepository`].
//!
//! Role names are stored lower-case; the (workspace, name) pair is
//! unique. Deleting a role removes its grants but leaves memberships
//! pointing at it dangling, which the evaluator tolerates.

use aurora_core::error::AuroraResult;
use aurora_core::models::role::{CreateRole, Role, UpdateRole};
use aurora_core::repository::RoleRepository;
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::write_error;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct RoleRow {
    workspace_id: String,
    name: String,
    description: String,
    created_at: Datetime,
    updated_at: Datetime,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct RoleRowWithId {
    record_id: String,
    workspace_id: String,
    name: String,
    description: String,
    created_at: Datetime,
    updated_at: Datetime,
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Result<Role, DbError> {
        let workspace_id = Uuid::parse_str(&self.workspace_id)
            .map_err(|e| DbError::Query(format!("invalid workspace UUID: {e}")))?;
        Ok(Role {
            id,
            workspace_id,
            name: self.name,
            description: self.description,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let workspace_id = Uuid::parse_str(&self.workspace_id)
            .map_err(|e| DbError::Query(format!("invalid workspace UUID: {e}")))?;
        Ok(Role {
            id,
            workspace_id,
            name: self.name,
            description: self.description,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> AuroraResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('role', $id) SET \
                 workspace_id = $workspace_id, \
                 name = string::lowercase($name), \
                 description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("workspace_id", input.workspace_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| write_error("role", e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> AuroraResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('role', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateRole) -> AuroraResult<Role> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = string::lowercase($name)");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::thing('role', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| write_error("role", e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn delete(&self, id: Uuid) -> AuroraResult<()> {
        let id_str = id.to_string();

        self.db
            .query("DELETE permission WHERE role_id = $id")
            .query("DELETE type::thing('role', $id)")
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_by_workspace(&self, workspace_id: Uuid) -> AuroraResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE workspace_id = $workspace_id \
                 ORDER BY name ASC",
            )
            .bind(("workspace_id", workspace_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
