use std::sync::Arc;

use relkv_core::{
    Cardinality, EntityDescriptor, EntityRegistry, Instance, InstanceManager, InstanceOptions,
    Record, RelationDescriptor,
};
use relkv_store::MemoryStore;
use serde_json::Value;

/// Fresh in-memory store for testing
#[allow(dead_code)]
pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Turn a `json!` object literal into a Record
#[allow(dead_code)]
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => panic!("record fixture must be a JSON object"),
    }
}

/// Registry for the user -> books -> pages graph
///
/// Both relations are MANY, cascade, eager. Book keys extend the user
/// key, page keys extend the book key, so cascades ride prefix scans.
#[allow(dead_code)]
pub fn library_registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    registry.register(
        EntityDescriptor::new("user", ["id"]).with_relation(
            RelationDescriptor::new("book", Cardinality::Many, "books", ["id"]).cascade(),
        ),
    );
    registry.register(
        EntityDescriptor::new("book", ["user_id", "id"]).with_relation(
            RelationDescriptor::new("page", Cardinality::Many, "pages", ["user_id", "id"])
                .cascade(),
        ),
    );
    registry.register(EntityDescriptor::new(
        "page",
        ["user_id", "book_id", "number"],
    ));
    registry
}

/// Instance named `library` over the user/book/page graph
#[allow(dead_code)]
pub fn library_instance(manager: &mut InstanceManager, store: Arc<MemoryStore>) -> Instance {
    let registry = library_registry();
    manager
        .init(
            store,
            &registry,
            &["user", "book", "page"],
            InstanceOptions::named("library"),
        )
        .unwrap()
}

/// Seed one user with two books and one page on the first book
#[allow(dead_code)]
pub fn seed_library(instance: &Instance) {
    let users = instance.repository("user").unwrap();
    let books = instance.repository("book").unwrap();
    let pages = instance.repository("page").unwrap();

    users
        .save(record(serde_json::json!({"id": "1234", "name": "Denosaur"})))
        .unwrap();
    books
        .save_many(vec![
            record(serde_json::json!({"user_id": "1234", "id": "b1", "title": "Ordered Keys"})),
            record(serde_json::json!({"user_id": "1234", "id": "b2", "title": "Prefix Scans"})),
        ])
        .unwrap();
    pages
        .save(record(
            serde_json::json!({"user_id": "1234", "book_id": "b1", "number": 1, "text": "intro"}),
        ))
        .unwrap();
}
