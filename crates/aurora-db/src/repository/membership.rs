//! SurrealDB implementation of [`MembershipRepository`].
//!
//! The (user, workspace) pair is unique. `upsert` first tries an
//! UPDATE of the existing pair; if nothing matched it CREATEs, and a
//! unique index violation on that CREATE (a concurrent upsert won the
//! race) falls back to the UPDATE path once more.

use aurora_core::error::AuroraResult;
use aurora_core::models::membership::{CreateMembership, Membership};
use aurora_core::repository::MembershipRepository;
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct MembershipRowWithId {
    record_id: String,
    user_id: String,
    workspace_id: String,
    role_id: Option<String>,
    active: bool,
    created_at: Datetime,
    updated_at: Datetime,
}

impl MembershipRowWithId {
    fn try_into_membership(self) -> Result<Membership, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Query(format!("invalid user UUID: {e}")))?;
        let workspace_id = Uuid::parse_str(&self.workspace_id)
            .map_err(|e| DbError::Query(format!("invalid workspace UUID: {e}")))?;
        let role_id = self
            .role_id
            .map(|r| Uuid::parse_str(&r))
            .transpose()
            .map_err(|e| DbError::Query(format!("invalid role UUID: {e}")))?;
        Ok(Membership {
            id,
            user_id,
            workspace_id,
            role_id,
            active: self.active,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

/// SurrealDB implementation of the Membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn update_existing(
        &self,
        input: &CreateMembership,
    ) -> Result<Option<Membership>, DbError> {
        let role_clause = match input.role_id {
            Some(_) => "role_id = $role_id",
            None => "role_id = NONE",
        };
        let query = format!(
            "UPDATE membership SET {role_clause}, updated_at = time::now() \
             WHERE user_id = $user_id AND workspace_id = $workspace_id \
             RETURN meta::id(id) AS record_id, *"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("user_id", input.user_id.to_string()))
            .bind(("workspace_id", input.workspace_id.to_string()));
        if let Some(role_id) = input.role_id {
            builder = builder.bind(("role_id", role_id.to_string()));
        }

        let mut result = builder.await?;
        let rows: Vec<MembershipRowWithId> = result.take(0)?;

        rows.into_iter()
            .next()
            .map(|row| row.try_into_membership())
            .transpose()
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn get(&self, user_id: Uuid, workspace_id: Uuid) -> AuroraResult<Membership> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE user_id = $user_id AND workspace_id = $workspace_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("workspace_id", workspace_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "membership".into(),
            id: format!("user={user_id} workspace={workspace_id}"),
        })?;

        Ok(row.try_into_membership()?)
    }

    async fn upsert(&self, input: CreateMembership) -> AuroraResult<Membership> {
        if let Some(existing) = self.update_existing(&input).await? {
            return Ok(existing);
        }

        let id_str = Uuid::new_v4().to_string();
        let role_clause = match input.role_id {
            Some(_) => "role_id = $role_id",
            None => "role_id = NONE",
        };
        let query = format!(
            "CREATE type::thing('membership', $id) SET \
             user_id = $user_id, workspace_id = $workspace_id, \
             {role_clause}, active = true \
             RETURN meta::id(id) AS record_id, *"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("workspace_id", input.workspace_id.to_string()));
        if let Some(role_id) = input.role_id {
            builder = builder.bind(("role_id", role_id.to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        match result.check() {
            Ok(mut result) => {
                let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
                let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                    entity: "membership".into(),
                    id: id_str,
                })?;
                Ok(row.try_into_membership()?)
            }
            // Lost a create race against a concurrent upsert of the
            // same pair; the row now exists, so update it instead.
            Err(_) => {
                let updated = self.update_existing(&input).await?;
                Ok(updated.ok_or_else(|| DbError::NotFound {
                    entity: "membership".into(),
                    id: format!("user={} workspace={}", input.user_id, input.workspace_id),
                })?)
            }
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> AuroraResult<Vec<Membership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE user_id = $user_id \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
