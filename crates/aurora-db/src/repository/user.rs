//! SurrealDB implementation of [`UserRepository`].
//!
//! Users are global rows keyed by email. Password hashing happens in
//! the service layer; this repository only stores and returns the
//! PHC-format hash it is given.

use aurora_core::error::AuroraResult;
use aurora_core::models::user::{CreateUser, GlobalRole, UpdateUser, User};
use aurora_core::repository::UserRepository;
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::write_error;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct UserRow {
    name: String,
    email: String,
    password_hash: String,
    role: String,
    active: bool,
    created_at: Datetime,
    updated_at: Datetime,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct UserRowWithId {
    record_id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    active: bool,
    created_at: Datetime,
    updated_at: Datetime,
}

fn parse_role(s: &str) -> Result<GlobalRole, DbError> {
    match s {
        "admin" => Ok(GlobalRole::Admin),
        "manager" => Ok(GlobalRole::Manager),
        "sales" => Ok(GlobalRole::Sales),
        other => Err(DbError::Query(format!("unknown global role: {other}"))),
    }
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            active: self.active,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            active: self.active,
            created_at: self.created_at.0,
            updated_at: self.updated_at.0,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> AuroraResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('user', $id) SET \
                 name = $name, email = $email, \
                 password_hash = $password_hash, \
                 role = $role, active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .bind(("role", input.role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| write_error("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> AuroraResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, email: &str) -> AuroraResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> AuroraResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::thing('user', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(password_hash) = input.password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }
}
