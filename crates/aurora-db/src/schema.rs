//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The uniqueness invariants of
//! the data model (workspace domains, user emails, membership pairs,
//! invite tokens, grant tuples) are enforced here with UNIQUE
//! indexes.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, Deserialize)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Workspaces (tenant roots)
-- =======================================================================
DEFINE TABLE workspace SCHEMAFULL;
DEFINE FIELD name ON TABLE workspace TYPE string;
DEFINE FIELD domain ON TABLE workspace TYPE string;
DEFINE FIELD plan ON TABLE workspace TYPE string \
    ASSERT $value IN ['basic', 'pro', 'premium'];
DEFINE FIELD enable_ai ON TABLE workspace TYPE bool DEFAULT true;
DEFINE FIELD enable_calls ON TABLE workspace TYPE bool DEFAULT true;
DEFINE FIELD enable_whatsapp ON TABLE workspace TYPE bool DEFAULT true;
DEFINE FIELD enable_automations ON TABLE workspace TYPE bool DEFAULT true;
DEFINE FIELD enable_campaigns ON TABLE workspace TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE workspace TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE workspace TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_workspace_domain ON TABLE workspace \
    COLUMNS domain UNIQUE;

-- =======================================================================
-- Workspace domains (host → tenant mappings)
-- =======================================================================
DEFINE TABLE workspace_domain SCHEMAFULL;
DEFINE FIELD workspace_id ON TABLE workspace_domain TYPE string;
DEFINE FIELD domain ON TABLE workspace_domain TYPE string;
DEFINE FIELD active ON TABLE workspace_domain TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE workspace_domain TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_workspace_domain_domain ON TABLE workspace_domain \
    COLUMNS domain UNIQUE;

-- =======================================================================
-- Users (global identities)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['admin', 'manager', 'sales'];
DEFINE FIELD active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Memberships (user ↔ workspace joins)
-- =======================================================================
DEFINE TABLE membership SCHEMAFULL;
DEFINE FIELD user_id ON TABLE membership TYPE string;
DEFINE FIELD workspace_id ON TABLE membership TYPE string;
DEFINE FIELD role_id ON TABLE membership TYPE option<string>;
DEFINE FIELD active ON TABLE membership TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_membership_user_workspace ON TABLE membership \
    COLUMNS user_id, workspace_id UNIQUE;

-- =======================================================================
-- Roles (workspace-scoped permission bundles)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD workspace_id ON TABLE role TYPE string;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_workspace_name ON TABLE role \
    COLUMNS workspace_id, name UNIQUE;

-- =======================================================================
-- Permission grants (role-level and direct membership-level)
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD role_id ON TABLE permission TYPE string;
DEFINE FIELD membership_id ON TABLE permission TYPE option<string>;
DEFINE FIELD module ON TABLE permission TYPE string \
    ASSERT $value IN ['leads', 'contacts', 'accounts', 'deals', \
    'campaigns', 'messaging', 'calls', 'ai', 'automations', 'settings'];
DEFINE FIELD action ON TABLE permission TYPE string \
    ASSERT $value IN ['view', 'create', 'edit', 'delete'];
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_tuple ON TABLE permission \
    COLUMNS role_id, membership_id, module, action UNIQUE;

-- =======================================================================
-- Invites (single-use onboarding tokens)
-- =======================================================================
DEFINE TABLE invite SCHEMAFULL;
DEFINE FIELD workspace_id ON TABLE invite TYPE string;
DEFINE FIELD email ON TABLE invite TYPE string;
DEFINE FIELD token ON TABLE invite TYPE string;
DEFINE FIELD role_id ON TABLE invite TYPE option<string>;
DEFINE FIELD expires_at ON TABLE invite TYPE datetime;
DEFINE FIELD accepted ON TABLE invite TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE invite TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE invite TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_invite_token ON TABLE invite COLUMNS token UNIQUE;
";

/// Apply all pending migrations.
///
/// Safe to call on every startup: already-applied versions are
/// skipped based on the `_migration` tracking table.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL).await?.check()?;

    let mut result = db.query("SELECT version, name FROM _migration").await?;
    let applied: Vec<MigrationRecord> = result.take(0)?;
    let applied_versions: Vec<u32> = applied.iter().map(|m| m.version).collect();

    for migration in MIGRATIONS {
        if applied_versions.contains(&migration.version) {
            continue;
        }

        info!(version = migration.version, name = migration.name, "Applying migration");

        db.query(migration.sql)
            .await?
            .check()
            .map_err(|e| DbError::Migration(format!("{} failed: {e}", migration.name)))?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Migration(format!("tracking insert failed: {e}")))?;
    }

    Ok(())
}
