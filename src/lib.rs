pub mod config;
pub mod errors;
pub mod factory;
pub mod query;
pub mod record;
pub mod store;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

use crate::config::EngineConfig;
use crate::errors::DbError;
use crate::query::{FindOptions, MutationEngine, QueryEngine};
use crate::record::Record;
use crate::store::{MemoryStore, RecordStore};
use bson::Document as BsonDocument;
use std::sync::Arc;

/// The main database struct: an in-process store plus the engines bound to it.
#[derive(Debug)]
pub struct Database {
    store: Arc<MemoryStore>,
    engine: MutationEngine,
}

impl Database {
    /// Opens a fresh in-memory database with default limits.
    #[must_use]
    pub fn open() -> Self {
        let store = Arc::new(MemoryStore::open_new());
        let engine = MutationEngine::new(store.clone());
        Self { store, engine }
    }

    /// # Errors
    /// Returns `Config` if a limit in `config` is zero.
    pub fn open_with_config(config: EngineConfig) -> Result<Self, DbError> {
        let store = Arc::new(MemoryStore::open_new());
        let engine = MutationEngine::with_config(store.clone(), config)?;
        Ok(Self { store, engine })
    }

    /// Close the store; later calls fail with `StoreUnavailable`.
    pub fn close(&self) {
        self.store.close();
    }

    /// Drop every record, keeping the database open.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if the database was closed.
    pub fn cleanup(&self) -> Result<(), DbError> {
        self.store.clear()
    }

    /// # Errors
    /// `DuplicateId`, `InvalidExpression` for a non-string `_id`, or `StoreUnavailable`.
    pub fn create(&self, collection: &str, data: BsonDocument) -> Result<Record, DbError> {
        self.store.create(collection, data)
    }

    /// # Errors
    /// See [`QueryEngine::evaluate`].
    pub fn find(
        &self,
        collection: &str,
        filter: &BsonDocument,
        opts: &FindOptions,
    ) -> Result<Vec<Record>, DbError> {
        Ok(self.query().evaluate(collection, filter, opts)?.to_vec())
    }

    /// # Errors
    /// See [`QueryEngine::evaluate`].
    pub fn find_one(&self, collection: &str, filter: &BsonDocument) -> Result<Option<Record>, DbError> {
        self.query().find_one(collection, filter, &FindOptions::default())
    }

    /// # Errors
    /// See [`MutationEngine::update_many`].
    pub fn update(
        &self,
        collection: &str,
        filter: &BsonDocument,
        update: &BsonDocument,
    ) -> Result<u64, DbError> {
        self.engine.update_many(collection, filter, update)
    }

    /// # Errors
    /// See [`MutationEngine::delete_many`].
    pub fn delete(&self, collection: &str, filter: &BsonDocument) -> Result<u64, DbError> {
        self.engine.delete_many(collection, filter)
    }

    /// # Errors
    /// See [`QueryEngine::count`].
    pub fn count(&self, collection: &str, filter: &BsonDocument) -> Result<u64, DbError> {
        self.query().count(collection, filter)
    }

    /// # Errors
    /// See [`QueryEngine::exists`].
    pub fn exists(&self, collection: &str, filter: &BsonDocument) -> Result<bool, DbError> {
        self.query().exists(collection, filter)
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    #[must_use]
    pub const fn query(&self) -> &QueryEngine {
        self.engine.query()
    }

    #[must_use]
    pub const fn mutation(&self) -> &MutationEngine {
        &self.engine
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::open()
    }
}
