use sea_orm::Database;
use uuid::Uuid;

use engine::{Engine, EngineError};
use migration::MigratorTrait;

async fn engine_with_users(usernames: &[&str]) -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    for username in usernames {
        engine
            .register(username, "password", "Test User", &format!("{username}@example.com"))
            .await
            .unwrap();
    }
    engine
}

#[tokio::test]
async fn new_group_trims_input_and_sets_matching_timestamps() {
    let engine = engine_with_users(&["alice"]).await;

    let group = engine
        .new_group("alice", "  Living  ", Some("   "))
        .await
        .unwrap();
    assert_eq!(group.name, "Living");
    assert_eq!(group.description, None);
    assert_eq!(group.created_at, group.updated_at);

    let fetched = engine.group("alice", group.id).await.unwrap();
    assert_eq!(fetched, group);
}

#[tokio::test]
async fn group_names_are_unique_per_user_ignoring_case() {
    let engine = engine_with_users(&["alice", "bob"]).await;
    engine.new_group("alice", "Food", None).await.unwrap();

    let err = engine.new_group("alice", " food ", None).await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("food".to_string()));

    // The name is only taken within the owner's groups.
    engine.new_group("bob", "Food", None).await.unwrap();
}

#[tokio::test]
async fn accented_names_collide_like_ascii_ones() {
    let engine = engine_with_users(&["alice"]).await;
    let ecole = engine.new_group("alice", "École", None).await.unwrap();

    // An exact repeat is a conflict, never a bare database error.
    let err = engine.new_group("alice", "École", None).await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("École".to_string()));

    // Folding covers the whole alphabet, not just ASCII.
    let err = engine.new_group("alice", "ÉCOLE", None).await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("ÉCOLE".to_string()));

    let maison = engine.new_group("alice", "Maison", None).await.unwrap();
    let err = engine
        .update_group("alice", maison.id, Some("éCOLE"), None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("éCOLE".to_string()));

    engine
        .new_category("alice", ecole.id, "Épicerie", None)
        .await
        .unwrap();
    let err = engine
        .new_category("alice", ecole.id, "ÉPICERIE", None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("ÉPICERIE".to_string()));

    let livres = engine
        .new_category("alice", ecole.id, "Livres", None)
        .await
        .unwrap();
    let err = engine
        .update_category("alice", ecole.id, livres.id, Some("épicerie"), None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("épicerie".to_string()));
}

#[tokio::test]
async fn update_group_checks_collisions_and_refreshes_updated_at() {
    let engine = engine_with_users(&["alice"]).await;
    let living = engine.new_group("alice", "Living", None).await.unwrap();
    let spending = engine.new_group("alice", "Spending", None).await.unwrap();

    let err = engine
        .update_group("alice", spending.id, Some("living"), None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("living".to_string()));

    // Writing the same name back to the same group is not a collision.
    let updated = engine
        .update_group("alice", living.id, Some("Living"), Some("Bills"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Living");
    assert_eq!(updated.description, Some("Bills".to_string()));
    assert!(updated.updated_at > living.updated_at);

    // Leaving the name out keeps it.
    let updated = engine
        .update_group("alice", living.id, None, Some("Everything"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Living");
}

#[tokio::test]
async fn groups_are_invisible_across_users() {
    let engine = engine_with_users(&["alice", "bob"]).await;
    let group = engine.new_group("alice", "Living", None).await.unwrap();

    let err = engine.group("bob", group.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Group not found".to_string()));

    let err = engine
        .update_group("bob", group.id, Some("Mine"), None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Group not found".to_string()));

    let err = engine.delete_group("bob", group.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Group not found".to_string()));

    assert_eq!(engine.groups("bob").await.unwrap(), vec![]);
    assert_eq!(engine.groups("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_group_id_is_not_found() {
    let engine = engine_with_users(&["alice"]).await;

    let err = engine.group("alice", Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Group not found".to_string()));
}

#[tokio::test]
async fn delete_group_is_blocked_while_it_has_children() {
    let engine = engine_with_users(&["alice"]).await;
    let group = engine.new_group("alice", "Living", None).await.unwrap();
    let category = engine
        .new_category("alice", group.id, "Rent", None)
        .await
        .unwrap();

    let err = engine.delete_group("alice", group.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InUse("Group still has categories or expenses".to_string())
    );

    engine
        .delete_category("alice", group.id, category.id)
        .await
        .unwrap();
    engine.delete_group("alice", group.id).await.unwrap();

    // A second delete finds nothing.
    let err = engine.delete_group("alice", group.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Group not found".to_string()));
}

#[tokio::test]
async fn categories_live_under_their_group() {
    let engine = engine_with_users(&["alice", "bob"]).await;
    let living = engine.new_group("alice", "Living", None).await.unwrap();
    let spending = engine.new_group("alice", "Spending", None).await.unwrap();

    let rent = engine
        .new_category("alice", living.id, " Rent ", Some("Due on the 1st"))
        .await
        .unwrap();
    assert_eq!(rent.name, "Rent");
    assert_eq!(rent.group_id, living.id);

    let err = engine
        .new_category("alice", living.id, "rent", None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("rent".to_string()));

    // Same name under a different group is fine.
    engine
        .new_category("alice", spending.id, "Rent", None)
        .await
        .unwrap();

    // The category is only reachable through its own group.
    let err = engine
        .category("alice", spending.id, rent.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("Category not found".to_string())
    );

    // And never through a group the caller does not own.
    let err = engine
        .new_category("bob", living.id, "Sneaky", None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Group not found".to_string()));
    let err = engine.categories("bob", living.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Group not found".to_string()));
}

#[tokio::test]
async fn update_category_keeps_absent_fields() {
    let engine = engine_with_users(&["alice"]).await;
    let group = engine.new_group("alice", "Living", None).await.unwrap();
    let category = engine
        .new_category("alice", group.id, "Rent", Some("Due on the 1st"))
        .await
        .unwrap();

    let updated = engine
        .update_category("alice", group.id, category.id, Some("Mortgage"), None)
        .await
        .unwrap();
    assert_eq!(updated.name, "Mortgage");
    assert_eq!(updated.note, Some("Due on the 1st".to_string()));
    assert!(updated.updated_at > category.updated_at);
}

#[tokio::test]
async fn categories_list_alphabetically() {
    let engine = engine_with_users(&["alice"]).await;
    let group = engine.new_group("alice", "Living", None).await.unwrap();

    for name in ["Utilities", "Groceries", "Rent"] {
        engine
            .new_category("alice", group.id, name, None)
            .await
            .unwrap();
    }

    let names: Vec<String> = engine
        .categories("alice", group.id)
        .await
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, ["Groceries", "Rent", "Utilities"]);
}
