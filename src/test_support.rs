#![cfg(test)]

// Tiny test-only helpers for seeded stores
use crate::store::MemoryStore;
use bson::Document as BsonDocument;
use std::sync::Arc;

/// An open store with `docs` inserted into `collection`, in order.
pub fn seeded_store(collection: &str, docs: Vec<BsonDocument>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::open_new());
    for d in docs {
        crate::store::RecordStore::create(&*store, collection, d).expect("seed insert failed");
    }
    store
}
