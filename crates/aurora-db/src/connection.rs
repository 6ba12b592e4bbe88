//! SurrealDB connection management.
//!
//! Connecting also applies pending schema migrations, so a freshly
//! pointed-at database is usable without a separate bootstrap step.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

/// Connection settings for the tenancy database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials for authentication.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "aurora".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Build a config from the process environment (`AURORA_DB_URL`,
    /// `AURORA_DB_NAMESPACE`, `AURORA_DB_DATABASE`,
    /// `AURORA_DB_USERNAME`, `AURORA_DB_PASSWORD`), falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("AURORA_DB_URL").unwrap_or(defaults.url),
            namespace: std::env::var("AURORA_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: std::env::var("AURORA_DB_DATABASE").unwrap_or(defaults.database),
            username: std::env::var("AURORA_DB_USERNAME").unwrap_or(defaults.username),
            password: std::env::var("AURORA_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// Manages the shared connection the repositories are built from.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect, authenticate as root, select the configured namespace
    /// and database, and bring the schema up to date.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: &config.username,
            password: &config.password,
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        run_migrations(&db).await?;

        info!("Tenancy database ready");

        Ok(Self { db })
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
