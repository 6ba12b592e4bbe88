//! Integration tests for the Workspace and WorkspaceDomain
//! repositories using in-memory SurrealDB.

use aurora_core::error::AuroraError;
use aurora_core::models::membership::CreateMembership;
use aurora_core::models::permission::{ActionKey, CreatePermissionGrant, ModuleKey};
use aurora_core::models::role::CreateRole;
use aurora_core::models::user::{CreateUser, GlobalRole};
use aurora_core::models::workspace::{CreateWorkspace, PlanTier, UpdateWorkspace};
use aurora_core::repository::{
    MembershipRepository, Pagination, PermissionRepository, RoleRepository, UserRepository,
    WorkspaceDomainRepository, WorkspaceRepository,
};
use aurora_db::repository::{
    SurrealMembershipRepository, SurrealPermissionRepository, SurrealRoleRepository,
    SurrealUserRepository, SurrealWorkspaceDomainRepository, SurrealWorkspaceRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    aurora_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn create_registers_the_primary_domain_mapping() {
    let db = setup().await;
    let repo = SurrealWorkspaceRepository::new(db.clone());

    let workspace = repo
        .create(CreateWorkspace {
            name: "Acme".into(),
            domain: "acme.crm.test".into(),
            plan: PlanTier::Pro,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(workspace.plan, PlanTier::Pro);
    assert!(workspace.enable_ai);

    let mapping = SurrealWorkspaceDomainRepository::new(db.clone())
        .get_by_domain("acme.crm.test")
        .await
        .unwrap();
    assert_eq!(mapping.workspace_id, workspace.id);
    assert!(mapping.active);
}

#[tokio::test]
async fn duplicate_domains_are_rejected() {
    let db = setup().await;
    let repo = SurrealWorkspaceRepository::new(db.clone());

    repo.create(CreateWorkspace {
        name: "Acme".into(),
        domain: "acme.crm.test".into(),
        ..Default::default()
    })
    .await
    .unwrap();

    let err = repo
        .create(CreateWorkspace {
            name: "Impostor".into(),
            domain: "acme.crm.test".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuroraError::AlreadyExists { .. }));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn domain_collision_with_an_alias_leaves_no_orphan_workspace() {
    let db = setup().await;
    let repo = SurrealWorkspaceRepository::new(db.clone());

    let acme = repo
        .create(CreateWorkspace {
            name: "Acme".into(),
            domain: "acme.crm.test".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let domain_repo = SurrealWorkspaceDomainRepository::new(db.clone());
    domain_repo
        .create(aurora_core::models::workspace::CreateWorkspaceDomain {
            workspace_id: acme.id,
            domain: "acme-alias.crm.test".into(),
            active: true,
        })
        .await
        .unwrap();

    // Only the mapping's unique index fires here, not the workspace
    // one; the whole create must still roll back.
    let err = repo
        .create(CreateWorkspace {
            name: "Impostor".into(),
            domain: "acme-alias.crm.test".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuroraError::AlreadyExists { .. }));

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(matches!(
        repo.get_by_primary_domain("acme-alias.crm.test")
            .await
            .unwrap_err(),
        AuroraError::NotFound { .. }
    ));
}

#[tokio::test]
async fn update_touches_only_provided_fields() {
    let db = setup().await;
    let repo = SurrealWorkspaceRepository::new(db.clone());

    let workspace = repo
        .create(CreateWorkspace {
            name: "Acme".into(),
            domain: "acme.crm.test".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            workspace.id,
            UpdateWorkspace {
                plan: Some(PlanTier::Premium),
                enable_whatsapp: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Acme");
    assert_eq!(updated.plan, PlanTier::Premium);
    assert!(!updated.enable_whatsapp);
    assert!(updated.enable_ai);
}

#[tokio::test]
async fn list_paginates_in_creation_order() {
    let db = setup().await;
    let repo = SurrealWorkspaceRepository::new(db.clone());

    for i in 0..5 {
        repo.create(CreateWorkspace {
            name: format!("W{i}"),
            domain: format!("w{i}.crm.test"),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 3);

    let rest = repo
        .list(Pagination {
            offset: 3,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 2);
}

#[tokio::test]
async fn get_features_reads_only_the_flags() {
    let db = setup().await;
    let repo = SurrealWorkspaceRepository::new(db.clone());

    let workspace = repo
        .create(CreateWorkspace {
            name: "Acme".into(),
            domain: "acme.crm.test".into(),
            enable_calls: false,
            ..Default::default()
        })
        .await
        .unwrap();

    let features = repo.get_features(workspace.id).await.unwrap();
    assert!(!features.calls);
    assert!(features.ai);
    assert!(features.campaigns);
}

#[tokio::test]
async fn delete_cascades_to_all_tenant_data() {
    let db = setup().await;
    let workspace_repo = SurrealWorkspaceRepository::new(db.clone());

    let workspace = workspace_repo
        .create(CreateWorkspace {
            name: "Acme".into(),
            domain: "acme.crm.test".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let user = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            role: GlobalRole::Sales,
        })
        .await
        .unwrap();

    let role = SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            workspace_id: workspace.id,
            name: "owner".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    SurrealPermissionRepository::new(db.clone())
        .grant(CreatePermissionGrant {
            role_id: role.id,
            membership_id: None,
            module: ModuleKey::Leads,
            action: ActionKey::Delete,
        })
        .await
        .unwrap();
    let membership_repo = SurrealMembershipRepository::new(db.clone());
    membership_repo
        .upsert(CreateMembership {
            user_id: user.id,
            workspace_id: workspace.id,
            role_id: Some(role.id),
        })
        .await
        .unwrap();

    workspace_repo.delete(workspace.id).await.unwrap();

    assert!(matches!(
        workspace_repo.get_by_id(workspace.id).await.unwrap_err(),
        AuroraError::NotFound { .. }
    ));
    assert!(matches!(
        SurrealWorkspaceDomainRepository::new(db.clone())
            .get_by_domain("acme.crm.test")
            .await
            .unwrap_err(),
        AuroraError::NotFound { .. }
    ));
    assert!(matches!(
        SurrealRoleRepository::new(db.clone())
            .get_by_id(role.id)
            .await
            .unwrap_err(),
        AuroraError::NotFound { .. }
    ));
    assert!(
        SurrealPermissionRepository::new(db.clone())
            .list_for_role(role.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(matches!(
        membership_repo
            .get(user.id, workspace.id)
            .await
            .unwrap_err(),
        AuroraError::NotFound { .. }
    ));

    // The global user survives: it may belong to other workspaces.
    SurrealUserRepository::new(db.clone())
        .get_by_id(user.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn alias_domains_can_be_added_and_listed() {
    let db = setup().await;
    let workspace = SurrealWorkspaceRepository::new(db.clone())
        .create(CreateWorkspace {
            name: "Acme".into(),
            domain: "acme.crm.test".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let domain_repo = SurrealWorkspaceDomainRepository::new(db.clone());
    domain_repo
        .create(aurora_core::models::workspace::CreateWorkspaceDomain {
            workspace_id: workspace.id,
            domain: "acme-alias.crm.test".into(),
            active: false,
        })
        .await
        .unwrap();

    let domains = domain_repo.list_by_workspace(workspace.id).await.unwrap();
    assert_eq!(domains.len(), 2);

    let alias = domain_repo
        .set_active("acme-alias.crm.test", true)
        .await
        .unwrap();
    assert!(alias.active);
}
