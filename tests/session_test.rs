/// Integration tests for session rows and admin credentials

mod common;

use common::*;
use robosust::app_config::AdminConfig;
use robosust::credentials;
use robosust::error::Error;
use robosust::orm::admin_sessions;
use robosust::session;
use sea_orm::{EntityTrait, PaginatorTrait};

#[actix_rt::test]
async fn test_sessions_are_independent() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let admin = create_test_admin(&db, "admin", TEST_PASSWORD).await;

    let first = session::new_session(&db, admin.id).await.unwrap();
    let second = session::new_session(&db, admin.id).await.unwrap();
    assert_ne!(first, second);

    let actor = session::authenticate_by_token(&db, &first)
        .await
        .unwrap()
        .expect("fresh session authenticates");
    assert_eq!(actor.id, admin.id);
    assert_eq!(actor.username, "admin");

    assert!(session::remove_session(&db, &first).await.unwrap());
    assert!(!session::remove_session(&db, &first).await.unwrap());
    assert!(session::authenticate_by_token(&db, &first).await.unwrap().is_none());
    assert!(session::authenticate_by_token(&db, &second).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_malformed_and_unknown_tokens() {
    let db = setup_test_database().await.expect("Failed to set up database");

    for token in ["", "not-a-uuid", "00000000-0000-0000-0000-000000000000"] {
        assert!(session::authenticate_by_token(&db, token)
            .await
            .unwrap()
            .is_none());
    }
}

#[actix_rt::test]
async fn test_revoke_other_sessions_keeps_current() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let admin = create_test_admin(&db, "admin", TEST_PASSWORD).await;
    let other_admin = create_test_admin(&db, "editor", TEST_PASSWORD).await;

    let keep = session::new_session(&db, admin.id).await.unwrap();
    session::new_session(&db, admin.id).await.unwrap();
    session::new_session(&db, admin.id).await.unwrap();
    let unrelated = session::new_session(&db, other_admin.id).await.unwrap();

    let revoked = session::revoke_other_sessions(&db, admin.id, &keep)
        .await
        .unwrap();
    assert_eq!(revoked, 2);

    assert!(session::authenticate_by_token(&db, &keep).await.unwrap().is_some());
    assert!(session::authenticate_by_token(&db, &unrelated).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_prune_expired_sessions() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let admin = create_test_admin(&db, "admin", TEST_PASSWORD).await;

    let live = session::new_session(&db, admin.id).await.unwrap();
    insert_expired_session(&db, admin.id, "6f1c1c1e-7c57-4c57-9b8e-0a0a0a0a0a01").await;
    insert_expired_session(&db, admin.id, "6f1c1c1e-7c57-4c57-9b8e-0a0a0a0a0a02").await;

    assert_eq!(session::prune_expired_sessions(&db).await.unwrap(), 2);
    assert_eq!(admin_sessions::Entity::find().count(&db).await.unwrap(), 1);
    assert!(session::authenticate_by_token(&db, &live).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_create_admin_rules() {
    let db = setup_test_database().await.expect("Failed to set up database");
    create_test_admin(&db, "admin", TEST_PASSWORD).await;

    assert!(matches!(
        credentials::create_admin(&db, "admin", "another-password").await,
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        credentials::create_admin(&db, "  ", "another-password").await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        credentials::create_admin(&db, "editor", "short").await,
        Err(Error::Validation(_))
    ));
}

#[actix_rt::test]
async fn test_verify_and_set_password() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let admin = create_test_admin(&db, "admin", TEST_PASSWORD).await;

    assert!(credentials::verify(&db, "admin", TEST_PASSWORD)
        .await
        .unwrap()
        .is_some());
    assert!(credentials::verify(&db, "admin", "nope").await.unwrap().is_none());
    assert!(credentials::verify(&db, "ghost", TEST_PASSWORD)
        .await
        .unwrap()
        .is_none());

    credentials::set_password(&db, admin.id, "a-whole-new-secret")
        .await
        .unwrap();
    assert!(credentials::verify(&db, "admin", "a-whole-new-secret")
        .await
        .unwrap()
        .is_some());

    assert!(matches!(
        credentials::set_password(&db, 9999, "a-whole-new-secret").await,
        Err(Error::NotFound("Admin"))
    ));
}

#[actix_rt::test]
async fn test_bootstrap_admin_only_on_empty_table() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let config = AdminConfig {
        username: "root".to_owned(),
        password: "configured-password".to_owned(),
    };
    let created = credentials::bootstrap_admin(&db, &config)
        .await
        .unwrap()
        .expect("first start creates the admin");
    assert_eq!(created.username, "root");
    assert!(credentials::verify(&db, "root", "configured-password")
        .await
        .unwrap()
        .is_some());

    assert!(credentials::bootstrap_admin(&db, &config)
        .await
        .unwrap()
        .is_none());
}

#[actix_rt::test]
async fn test_bootstrap_admin_generates_password() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let created = credentials::bootstrap_admin(&db, &AdminConfig::default())
        .await
        .unwrap()
        .expect("first start creates the admin");
    assert_eq!(created.username, "admin");
    assert!(created.password_hash.starts_with("$argon2"));
}
