//! SurrealDB implementation of [`InviteRepository`].
//!
//! `mark_accepted` is the commit point of invite redemption: a single
//! conditional UPDATE flips `accepted` from false to true, so of any
//! number of concurrent redeemers exactly one observes the
//! transition.

use aurora_core::error::{AuroraError, AuroraResult};
use aurora_core::models::invite::{CreateInvite, Invite};
use aurora_core::repository::{InviteRepository, PaginatedResult, Pagination};
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::write_error;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct InviteRow {
    workspace_id: String,
    email: String,
    token: String,
    role_id: Option<String>,
    expires_at: Datetime,
    accepted: bool,
    created_at: Datetime,
    updated_at: Datetime,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct InviteRowWithId {
    record_id: String,
    workspace_id: String,
    email: String,
    token: String,
    role_id: Option<String>,
    expires_at: Datetime,
    accepted: bool,
    created_at: Datetime,
    updated_at: Datetime,
}

impl InviteRow {
    fn into_invite(self, id: Uuid) -> Result<Invite, DbError> {
        let workspace_id = Uuid::parse_str(&self.workspace_id)
            .map_err(|e| DbError::Query(format!("invalid workspace UUID: {e}")))?;
        let role_id = self
            .role_id
            .map(|r| Uuid::parse_str(&r))
            .transpose()
            .map_err(|e| DbError::Query(format!("invalid role UUID: {e}")))?;
        Ok(Invite {
            id,
            email: self.email,
            token: self.token,
            role_id,
            workspace_id,
            expires_at: self.expires_at.0,
            accepted: self.accepted,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

impl InviteRowWithId {
    fn try_into_invite(self) -> Result<Invite, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        let workspace_id = Uuid::parse_str(&self.workspace_id)
            .map_err(|e| DbError::Query(format!("invalid workspace UUID: {e}")))?;
        let role_id = self
            .role_id
            .map(|r| Uuid::parse_str(&r))
            .transpose()
            .map_err(|e| DbError::Query(format!("invalid role UUID: {e}")))?;
        Ok(Invite {
            id,
            email: self.email,
            token: self.token,
            role_id,
            workspace_id,
            expires_at: self.expires_at.0,
            accepted: self.accepted,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Invite repository.
#[derive(Clone)]
pub struct SurrealInviteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInviteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InviteRepository for SurrealInviteRepository<C> {
    async fn create(&self, input: CreateInvite) -> AuroraResult<Invite> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let role_clause = match input.role_id {
            Some(_) => "role_id = $role_id",
            None => "role_id = NONE",
        };
        let query = format!(
            "CREATE type::thing('invite', $id) SET \
             workspace_id = $workspace_id, email = $email, \
             token = $invite_token, {role_clause}, \
             expires_at = $expires_at, accepted = false"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("workspace_id", input.workspace_id.to_string()))
            .bind(("email", input.email))
            .bind(("invite_token", input.token))
            .bind(("expires_at", Datetime::from(input.expires_at)));
        if let Some(role_id) = input.role_id {
            builder = builder.bind(("role_id", role_id.to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| write_error("invite", e))?;

        let rows: Vec<InviteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invite".into(),
            id: id_str,
        })?;

        Ok(row.into_invite(id)?)
    }

    async fn get_by_token(&self, token: &str) -> AuroraResult<Invite> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invite \
                 WHERE token = $invite_token",
            )
            .bind(("invite_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invite".into(),
            id: format!("token={token}"),
        })?;

        Ok(row.try_into_invite()?)
    }

    async fn list_by_workspace(
        &self,
        workspace_id: Uuid,
        pagination: Pagination,
    ) -> AuroraResult<PaginatedResult<Invite>> {
        let workspace_id_str = workspace_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM invite \
                 WHERE workspace_id = $workspace_id GROUP ALL",
            )
            .bind(("workspace_id", workspace_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invite \
                 WHERE workspace_id = $workspace_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("workspace_id", workspace_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_invite())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn mark_accepted(&self, token: &str) -> AuroraResult<Invite> {
        let mut result = self
            .db
            .query(
                "UPDATE invite SET accepted = true, updated_at = time::now() \
                 WHERE token = $invite_token AND accepted = false \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("invite_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRowWithId> = result.take(0).map_err(DbError::from)?;

        match rows.into_iter().next() {
            Some(row) => Ok(row.try_into_invite()?),
            // Nothing flipped: either the token does not exist, or a
            // concurrent redeemer already won. Distinguish the two.
            None => match self.get_by_token(token).await {
                Ok(_) => Err(AuroraError::InviteAlreadyUsed),
                Err(e) => Err(e),
            },
        }
    }

    async fn delete_by_token(&self, token: &str) -> AuroraResult<()> {
        self.db
            .query("DELETE invite WHERE token = $invite_token")
            .bind(("invite_token", token.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
