//! Integration tests for the Membership, Role, and Permission
//! repositories using in-memory SurrealDB.

use aurora_core::error::AuroraError;
use aurora_core::models::membership::CreateMembership;
use aurora_core::models::permission::{ActionKey, CreatePermissionGrant, ModuleKey};
use aurora_core::models::role::{CreateRole, UpdateRole};
use aurora_core::models::user::{CreateUser, GlobalRole};
use aurora_core::models::workspace::CreateWorkspace;
use aurora_core::repository::{
    MembershipRepository, PermissionRepository, RoleRepository, UserRepository,
    WorkspaceRepository,
};
use aurora_db::repository::{
    SurrealMembershipRepository, SurrealPermissionRepository, SurrealRoleRepository,
    SurrealUserRepository, SurrealWorkspaceRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Spin up in-memory DB, run migrations, create a workspace and a
/// user.
async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    aurora_db::run_migrations(&db).await.unwrap();

    let workspace = SurrealWorkspaceRepository::new(db.clone())
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

    (db, workspace.id, user.id)
}

#[tokio::test]
async fn upsert_keeps_one_membership_per_pair() {
    let (db, workspace_id, user_id) = setup().await;
    let repo = SurrealMembershipRepository::new(db.clone());

    let first = repo
        .upsert(CreateMembership {
            user_id,
            workspace_id,
            role_id: None,
        })
        .await
        .unwrap();
    assert!(first.active);
    assert_eq!(first.role_id, None);

    let role = SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            workspace_id,
            name: "seller".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    // Second upsert re-points the same row at the new role.
    let second = repo
        .upsert(CreateMembership {
            user_id,
            workspace_id,
            role_id: Some(role.id),
        })
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.role_id, Some(role.id));

    let memberships = repo.list_for_user(user_id).await.unwrap();
    assert_eq!(memberships.len(), 1);
}

#[tokio::test]
async fn membership_get_is_pair_scoped() {
    let (db, workspace_id, user_id) = setup().await;
    let repo = SurrealMembershipRepository::new(db.clone());

    repo.upsert(CreateMembership {
        user_id,
        workspace_id,
        role_id: None,
    })
    .await
    .unwrap();

    repo.get(user_id, workspace_id).await.unwrap();
    let err = repo.get(user_id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AuroraError::NotFound { .. }));
    let err = repo.get(Uuid::new_v4(), workspace_id).await.unwrap_err();
    assert!(matches!(err, AuroraError::NotFound { .. }));
}

#[tokio::test]
async fn role_names_are_lowercased_and_unique_per_workspace() {
    let (db, workspace_id, _user_id) = setup().await;
    let repo = SurrealRoleRepository::new(db.clone());

    let role = repo
        .create(CreateRole {
            workspace_id,
            name: "Support".into(),
            description: "customer support".into(),
        })
        .await
        .unwrap();
    assert_eq!(role.name, "support");

    let err = repo
        .create(CreateRole {
            workspace_id,
            name: "SUPPORT".into(),
            description: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuroraError::AlreadyExists { .. }));

    // Same name in another workspace is fine.
    let other = SurrealWorkspaceRepository::new(db.clone())
        .create(CreateWorkspace {
            name: "Globex".into(),
            domain: "globex.crm.test".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    repo.create(CreateRole {
        workspace_id: other.id,
        name: "support".into(),
        description: String::new(),
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn role_update_and_listing() {
    let (db, workspace_id, _user_id) = setup().await;
    let repo = SurrealRoleRepository::new(db.clone());

    let role = repo
        .create(CreateRole {
            workspace_id,
            name: "support".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    repo.create(CreateRole {
        workspace_id,
        name: "marketing".into(),
        description: String::new(),
    })
    .await
    .unwrap();

    let updated = repo
        .update(
            role.id,
            UpdateRole {
                description: Some("tier-1 support".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "tier-1 support");
    assert_eq!(updated.name, "support");

    let roles = repo.list_by_workspace(workspace_id).await.unwrap();
    assert_eq!(roles.len(), 2);
}

#[tokio::test]
async fn grants_are_idempotent() {
    let (db, workspace_id, _user_id) = setup().await;

    let role = SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            workspace_id,
            name: "support".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    let repo = SurrealPermissionRepository::new(db.clone());
    let input = CreatePermissionGrant {
        role_id: role.id,
        membership_id: None,
        module: ModuleKey::Contacts,
        action: ActionKey::Edit,
    };
    let first = repo.grant(input.clone()).await.unwrap();
    let second = repo.grant(input).await.unwrap();
    assert_eq!(first.id, second.id);

    let grants = repo.list_for_role(role.id).await.unwrap();
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn direct_grants_are_separate_from_role_grants() {
    let (db, workspace_id, user_id) = setup().await;

    let role = SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            workspace_id,
            name: "support".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    let membership = SurrealMembershipRepository::new(db.clone())
        .upsert(CreateMembership {
            user_id,
            workspace_id,
            role_id: Some(role.id),
        })
        .await
        .unwrap();

    let repo = SurrealPermissionRepository::new(db.clone());
    repo.grant(CreatePermissionGrant {
        role_id: role.id,
        membership_id: None,
        module: ModuleKey::Contacts,
        action: ActionKey::Edit,
    })
    .await
    .unwrap();
    repo.grant(CreatePermissionGrant {
        role_id: role.id,
        membership_id: Some(membership.id),
        module: ModuleKey::Contacts,
        action: ActionKey::Delete,
    })
    .await
    .unwrap();

    // Role listing sees both; membership listing only the direct one.
    assert_eq!(repo.list_for_role(role.id).await.unwrap().len(), 2);
    let direct = repo.list_for_membership(membership.id).await.unwrap();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].action, ActionKey::Delete);
}

#[tokio::test]
async fn revoke_removes_exactly_one_tuple() {
    let (db, workspace_id, _user_id) = setup().await;

    let role = SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            workspace_id,
            name: "support".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    let repo = SurrealPermissionRepository::new(db.clone());
    for action in [ActionKey::View, ActionKey::Edit] {
        repo.grant(CreatePermissionGrant {
            role_id: role.id,
            membership_id: None,
            module: ModuleKey::Contacts,
            action,
        })
        .await
        .unwrap();
    }

    repo.revoke(role.id, None, ModuleKey::Contacts, ActionKey::Edit)
        .await
        .unwrap();

    let grants = repo.list_for_role(role.id).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].action, ActionKey::View);
}

#[tokio::test]
async fn role_delete_removes_grants_but_not_memberships() {
    let (db, workspace_id, user_id) = setup().await;

    let role_repo = SurrealRoleRepository::new(db.clone());
    let role = role_repo
        .create(CreateRole {
            workspace_id,
            name: "support".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    SurrealPermissionRepository::new(db.clone())
        .grant(CreatePermissionGrant {
            role_id: role.id,
            membership_id: None,
            module: ModuleKey::Contacts,
            action: ActionKey::View,
        })
        .await
        .unwrap();
    SurrealMembershipRepository::new(db.clone())
        .upsert(CreateMembership {
            user_id,
            workspace_id,
            role_id: Some(role.id),
        })
        .await
        .unwrap();

    role_repo.delete(role.id).await.unwrap();

    assert!(
        SurrealPermissionRepository::new(db.clone())
            .list_for_role(role.id)
            .await
            .unwrap()
            .is_empty()
    );
    // The membership survives with a dangling role reference.
    let membership = SurrealMembershipRepository::new(db.clone())
        .get(user_id, workspace_id)
        .await
        .unwrap();
    assert_eq!(membership.role_id, Some(role.id));
}

#[tokio::test]
async fn duplicate_emails_are_rejected() {
    let (db, _workspace_id, _user_id) = setup().await;

    let err = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            name: "Other Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            role: GlobalRole::Manager,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuroraError::AlreadyExists { .. }));
}
