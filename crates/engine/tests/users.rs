use sea_orm::{Database, DatabaseConnection, EntityTrait};

use engine::{Engine, EngineError};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

#[tokio::test]
async fn register_stores_an_argon2_hash() {
    let (engine, db) = engine_with_db().await;

    engine
        .register("alice", "hunter2", "Alice", "alice@example.com")
        .await
        .unwrap();

    let user = engine::users::Entity::find_by_id("alice")
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(user.password, "hunter2");
    assert!(user.password.starts_with("$argon2"));
    assert_eq!(user.token, None);
}

#[tokio::test]
async fn register_rejects_taken_username_and_email() {
    let (engine, _db) = engine_with_db().await;
    engine
        .register("alice", "hunter2", "Alice", "alice@example.com")
        .await
        .unwrap();

    let err = engine
        .register("alice", "pw", "Other", "other@example.com")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice".to_string()));

    let err = engine
        .register("bob", "pw", "Bob", "alice@example.com")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice@example.com".to_string()));
}

#[tokio::test]
async fn register_reports_every_violation_at_once() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.register("", "", "Alice", "nope").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation(
            "username must not be empty. password must not be empty. \
             email must be a valid email address"
                .to_string()
        )
    );
}

#[tokio::test]
async fn login_issues_and_replaces_tokens() {
    let (engine, _db) = engine_with_db().await;
    engine
        .register("alice", "hunter2", "Alice", "alice@example.com")
        .await
        .unwrap();

    let err = engine.login("alice", "wrong").await.unwrap_err();
    assert_eq!(err, EngineError::InvalidCredentials);
    let err = engine.login("ghost", "hunter2").await.unwrap_err();
    assert_eq!(err, EngineError::InvalidCredentials);

    let first = engine.login("alice", "hunter2").await.unwrap();
    let resolved = engine.user_by_token(&first).await.unwrap().unwrap();
    assert_eq!(resolved.username, "alice");

    // A second login invalidates the first token.
    let second = engine.login("alice", "hunter2").await.unwrap();
    assert_ne!(first, second);
    assert!(engine.user_by_token(&first).await.unwrap().is_none());

    engine.logout("alice").await.unwrap();
    assert!(engine.user_by_token(&second).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_update_requires_a_field_and_rehashes() {
    let (engine, _db) = engine_with_db().await;
    engine
        .register("alice", "hunter2", "Alice", "alice@example.com")
        .await
        .unwrap();

    let err = engine.update_profile("alice", None, None).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("name or password is required".to_string())
    );

    let updated = engine
        .update_profile("alice", Some("Alice Cooper"), Some("new password"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Alice Cooper");

    let err = engine.login("alice", "hunter2").await.unwrap_err();
    assert_eq!(err, EngineError::InvalidCredentials);
    engine.login("alice", "new password").await.unwrap();
}

#[tokio::test]
async fn profile_update_for_unknown_user_is_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .update_profile("ghost", Some("Ghost"), None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("User not found".to_string()));
}
