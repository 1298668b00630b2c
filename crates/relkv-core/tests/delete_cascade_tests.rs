mod common;

use common::{library_instance, memory_store, record, seed_library};
use relkv_core::{
    Cardinality, EntityDescriptor, EntityRegistry, ErrorKind, FindOptions, InstanceManager,
    InstanceOptions, RelKvError, RelationDescriptor,
};
use serde_json::json;

// ===== DELETE VALIDATION =====

#[test]
fn test_delete_missing_keys_is_delete_validation() {
    let mut manager = InstanceManager::new();
    let instance = library_instance(&mut manager, memory_store());
    let users = instance.repository("user").unwrap();

    let err = users.delete(&record(json!({"name": "no id"}))).unwrap_err();

    assert!(matches!(&err, RelKvError::DeleteMissingKeys { fields } if fields == &["id"]));
    assert_eq!(err.kind(), ErrorKind::DeleteValidation);
}

#[test]
fn test_delete_absent_record_fails_and_stages_nothing() {
    let mut manager = InstanceManager::new();
    let store = memory_store();
    let instance = library_instance(&mut manager, store.clone());
    let users = instance.repository("user").unwrap();

    let err = users.delete(&record(json!({"id": "ghost"}))).unwrap_err();

    match err {
        RelKvError::DeleteTargetNotFound { key } => {
            assert_eq!(key.to_string(), "[user,ghost]");
        }
        other => panic!("expected DeleteTargetNotFound, got {:?}", other),
    }
    assert!(store.is_empty());
}

#[test]
fn test_delete_then_find_returns_none() {
    let mut manager = InstanceManager::new();
    let instance = library_instance(&mut manager, memory_store());
    let users = instance.repository("user").unwrap();

    users
        .save(record(json!({"id": "1234", "name": "Denosaur"})))
        .unwrap();
    users.delete(&record(json!({"id": "1234"}))).unwrap();

    let found = users
        .find_by_ids(&record(json!({"id": "1234"})), FindOptions::default())
        .unwrap();
    assert!(found.is_none());
}

// ===== CASCADE =====

#[test]
fn test_cascade_many_deletes_whole_prefix_transitively() {
    let mut manager = InstanceManager::new();
    let store = memory_store();
    let instance = library_instance(&mut manager, store.clone());
    seed_library(&instance);

    // A second user whose records must survive the cascade
    let users = instance.repository("user").unwrap();
    let books = instance.repository("book").unwrap();
    users
        .save(record(json!({"id": "5678", "name": "Other"})))
        .unwrap();
    books
        .save(record(json!({"user_id": "5678", "id": "b1", "title": "Kept"})))
        .unwrap();

    users.delete(&record(json!({"id": "1234"}))).unwrap();

    // user 1234, both books, and the page are gone in one commit
    assert!(books
        .find_by_ids(
            &record(json!({"user_id": "1234", "id": "b1"})),
            FindOptions::default()
        )
        .unwrap()
        .is_none());
    let pages = instance.repository("page").unwrap();
    assert!(pages.find_all(FindOptions::default()).unwrap().is_empty());

    // the other user's graph is untouched
    assert!(books
        .find_by_ids(
            &record(json!({"user_id": "5678", "id": "b1"})),
            FindOptions::default()
        )
        .unwrap()
        .is_some());
}

#[test]
fn test_cascade_one_deletes_descendant_chain() {
    // root -ONE-> mid -ONE-> leaf, all cascading
    let mut registry = EntityRegistry::new();
    registry.register(
        EntityDescriptor::new("root", ["id"]).with_relation(
            RelationDescriptor::new("mid", Cardinality::One, "mid", ["id"]).cascade(),
        ),
    );
    registry.register(
        EntityDescriptor::new("mid", ["root_id"]).with_relation(
            RelationDescriptor::new("leaf", Cardinality::One, "leaf", ["root_id"]).cascade(),
        ),
    );
    registry.register(EntityDescriptor::new("leaf", ["root_id"]));

    let mut manager = InstanceManager::new();
    let store = memory_store();
    let instance = manager
        .init(
            store.clone(),
            &registry,
            &["root", "mid", "leaf"],
            InstanceOptions::named("chain"),
        )
        .unwrap();

    instance
        .repository("root")
        .unwrap()
        .save(record(json!({"id": "1"})))
        .unwrap();
    instance
        .repository("mid")
        .unwrap()
        .save(record(json!({"root_id": "1"})))
        .unwrap();
    instance
        .repository("leaf")
        .unwrap()
        .save(record(json!({"root_id": "1"})))
        .unwrap();
    assert_eq!(store.len(), 3);

    instance
        .repository("root")
        .unwrap()
        .delete(&record(json!({"id": "1"})))
        .unwrap();

    assert!(store.is_empty());
}

#[test]
fn test_no_action_leaves_related_records() {
    let mut registry = EntityRegistry::new();
    registry.register(
        EntityDescriptor::new("user", ["id"]).with_relation(RelationDescriptor::new(
            "book",
            Cardinality::Many,
            "books",
            ["id"],
        )),
    );
    registry.register(EntityDescriptor::new("book", ["user_id", "id"]));

    let mut manager = InstanceManager::new();
    let instance = manager
        .init(
            memory_store(),
            &registry,
            &["user", "book"],
            InstanceOptions::named("no-action"),
        )
        .unwrap();
    let users = instance.repository("user").unwrap();
    let books = instance.repository("book").unwrap();

    users.save(record(json!({"id": "1"}))).unwrap();
    books
        .save(record(json!({"user_id": "1", "id": "b1"})))
        .unwrap();

    users.delete(&record(json!({"id": "1"}))).unwrap();

    assert_eq!(books.find_all(FindOptions::default()).unwrap().len(), 1);
}

#[test]
fn test_delete_many_is_one_atomic_batch() {
    let mut manager = InstanceManager::new();
    let store = memory_store();
    let instance = library_instance(&mut manager, store.clone());
    let users = instance.repository("user").unwrap();

    users
        .save_many(vec![
            record(json!({"id": "1", "name": "one"})),
            record(json!({"id": "2", "name": "two"})),
        ])
        .unwrap();

    // Second target does not exist: the whole call aborts
    let result = users.delete_many(&[
        record(json!({"id": "1"})),
        record(json!({"id": "ghost"})),
    ]);
    assert!(result.is_err());

    // Nothing was deleted
    assert_eq!(users.find_all(FindOptions::default()).unwrap().len(), 2);
}

// ===== ORPHAN CLEANUP ON RE-SAVE =====

fn post_registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    registry.register(
        EntityDescriptor::new("post", ["id"]).with_relation(
            RelationDescriptor::new("attachment", Cardinality::One, "attachment", [
                "attachment_id",
            ])
            .cascade(),
        ),
    );
    registry.register(EntityDescriptor::new("attachment", ["id"]));
    registry
}

#[test]
fn test_resave_with_cleared_foreign_key_cascades_old_subtree() {
    let mut manager = InstanceManager::new();
    let registry = post_registry();
    let instance = manager
        .init(
            memory_store(),
            &registry,
            &["post", "attachment"],
            InstanceOptions::named("posts"),
        )
        .unwrap();
    let posts = instance.repository("post").unwrap();
    let attachments = instance.repository("attachment").unwrap();

    posts
        .save(record(json!({"id": "p1", "attachment_id": "a1"})))
        .unwrap();
    attachments
        .save(record(json!({"id": "a1", "bytes": "..."})))
        .unwrap();

    // Re-save the post with the foreign key cleared
    posts.save(record(json!({"id": "p1"}))).unwrap();

    assert!(attachments
        .find_by_ids(&record(json!({"id": "a1"})), FindOptions::default())
        .unwrap()
        .is_none());
    // The new post value persisted in the same commit
    let found = posts
        .find_by_ids(&record(json!({"id": "p1"})), FindOptions::default())
        .unwrap()
        .unwrap();
    assert!(!found.record().contains_key("attachment_id"));
}

#[test]
fn test_resave_with_kept_foreign_key_leaves_subtree() {
    let mut manager = InstanceManager::new();
    let registry = post_registry();
    let instance = manager
        .init(
            memory_store(),
            &registry,
            &["post", "attachment"],
            InstanceOptions::named("posts"),
        )
        .unwrap();
    let posts = instance.repository("post").unwrap();
    let attachments = instance.repository("attachment").unwrap();

    posts
        .save(record(json!({"id": "p1", "attachment_id": "a1"})))
        .unwrap();
    attachments.save(record(json!({"id": "a1"}))).unwrap();

    posts
        .save(record(json!({"id": "p1", "attachment_id": "a1", "title": "edited"})))
        .unwrap();

    assert!(attachments
        .find_by_ids(&record(json!({"id": "a1"})), FindOptions::default())
        .unwrap()
        .is_some());
}
