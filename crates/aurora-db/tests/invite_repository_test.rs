//! Integration tests for the Invite repository using in-memory
//! SurrealDB, with emphasis on the accepted-flag compare-and-set.

use aurora_core::error::AuroraError;
use aurora_core::models::invite::CreateInvite;
use aurora_core::models::workspace::CreateWorkspace;
use aurora_core::repository::{InviteRepository, Pagination, WorkspaceRepository};
use aurora_db::repository::{SurrealInviteRepository, SurrealWorkspaceRepository};
use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Spin up in-memory DB, run migrations, create one workspace.
async fn setup() -> (Surreal<Db>, Uuid) {
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

    (db, workspace.id)
}

fn invite_input(workspace_id: Uuid, email: &str, token: &str) -> CreateInvite {
    CreateInvite {
        workspace_id,
        email: email.into(),
        token: token.into(),
        role_id: None,
        expires_at: Utc::now() + Duration::days(7),
    }
}

#[tokio::test]
async fn create_and_fetch_by_token() {
    let (db, workspace_id) = setup().await;
    let repo = SurrealInviteRepository::new(db.clone());

    let created = repo
        .create(invite_input(workspace_id, "bob@example.com", "tok-1"))
        .await
        .unwrap();
    assert!(!created.accepted);

    let fetched = repo.get_by_token("tok-1").await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.email, "bob@example.com");

    let err = repo.get_by_token("tok-missing").await.unwrap_err();
    assert!(matches!(err, AuroraError::NotFound { .. }));
}

#[tokio::test]
async fn tokens_are_unique() {
    let (db, workspace_id) = setup().await;
    let repo = SurrealInviteRepository::new(db.clone());

    repo.create(invite_input(workspace_id, "bob@example.com", "tok-1"))
        .await
        .unwrap();
    let err = repo
        .create(invite_input(workspace_id, "carol@example.com", "tok-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuroraError::AlreadyExists { .. }));
}

#[tokio::test]
async fn mark_accepted_flips_exactly_once() {
    let (db, workspace_id) = setup().await;
    let repo = SurrealInviteRepository::new(db.clone());

    repo.create(invite_input(workspace_id, "bob@example.com", "tok-1"))
        .await
        .unwrap();

    let accepted = repo.mark_accepted("tok-1").await.unwrap();
    assert!(accepted.accepted);

    // The losing side of the race.
    let err = repo.mark_accepted("tok-1").await.unwrap_err();
    assert!(matches!(err, AuroraError::InviteAlreadyUsed));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn mark_accepted_on_unknown_token_is_not_found() {
    let (db, _workspace_id) = setup().await;
    let repo = SurrealInviteRepository::new(db.clone());

    let err = repo.mark_accepted("tok-missing").await.unwrap_err();
    assert!(matches!(err, AuroraError::NotFound { .. }));
}

#[tokio::test]
async fn concurrent_redemption_has_a_single_winner() {
    let (db, workspace_id) = setup().await;
    let repo = SurrealInviteRepository::new(db.clone());

    repo.create(invite_input(workspace_id, "bob@example.com", "tok-1"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(
            async move { repo.mark_accepted("tok-1").await },
        ));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(invite) => {
                assert!(invite.accepted);
                winners += 1;
            }
            Err(e) => assert!(matches!(e, AuroraError::InviteAlreadyUsed)),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn delete_by_token_removes_the_invite() {
    let (db, workspace_id) = setup().await;
    let repo = SurrealInviteRepository::new(db.clone());

    repo.create(invite_input(workspace_id, "bob@example.com", "tok-1"))
        .await
        .unwrap();
    repo.delete_by_token("tok-1").await.unwrap();

    let err = repo.get_by_token("tok-1").await.unwrap_err();
    assert!(matches!(err, AuroraError::NotFound { .. }));
}

#[tokio::test]
async fn list_is_workspace_scoped_and_paginated() {
    let (db, workspace_id) = setup().await;
    let repo = SurrealInviteRepository::new(db.clone());

    let other = SurrealWorkspaceRepository::new(db.clone())
        .create(CreateWorkspace {
            name: "Globex".into(),
            domain: "globex.crm.test".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    for i in 0..4 {
        repo.create(invite_input(
            workspace_id,
            &format!("user{i}@example.com"),
            &format!("tok-{i}"),
        ))
        .await
        .unwrap();
    }
    repo.create(invite_input(other.id, "elsewhere@example.com", "tok-other"))
        .await
        .unwrap();

    let page = repo
        .list_by_workspace(
            workspace_id,
            Pagination {
                offset: 0,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|i| i.workspace_id == workspace_id));
}
