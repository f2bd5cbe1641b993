use crate::errors::DbError;
use crate::record::Record;
use crate::types::RecordId;
use bson::Document as BsonDocument;

/// Mutable view of a store handed to the closure of [`RecordStore::with_write_scope`].
///
/// Changes made through a scope become visible together when the closure
/// returns `Ok`, and are discarded when it returns `Err`.
pub trait WriteScope {
    /// Borrow a record for in-place mutation. `None` if it does not exist (or
    /// was removed earlier in this scope).
    fn get_mut(&mut self, collection: &str, id: &RecordId) -> Option<&mut Record>;

    /// Remove a record. Returns false if it was not present.
    fn remove(&mut self, collection: &str, id: &RecordId) -> bool;
}

/// Closure type run inside a write scope.
pub type ScopeFn<'a> = dyn FnMut(&mut dyn WriteScope) -> Result<(), DbError> + 'a;

/// Keyed object store consumed by the query and mutation engines.
///
/// Every method fails with `StoreUnavailable` while the store is not open.
pub trait RecordStore: Send + Sync {
    fn is_open(&self) -> bool;

    /// Insert a record. The store assigns `_id`, `createdAt` and `updatedAt`
    /// unless the caller supplies them.
    fn create(&self, collection: &str, data: BsonDocument) -> Result<Record, DbError>;

    /// All records of a collection in insertion order. Unknown collections are empty.
    fn all_of(&self, collection: &str) -> Result<Vec<Record>, DbError>;

    /// Run `f` atomically: all of its mutations are applied, or none are.
    fn with_write_scope(&self, f: &mut ScopeFn<'_>) -> Result<(), DbError>;

    /// Remove the given records in one write scope; returns how many existed.
    fn delete(&self, collection: &str, ids: &[RecordId]) -> Result<u64, DbError> {
        let mut removed = 0u64;
        self.with_write_scope(&mut |scope: &mut dyn WriteScope| -> Result<(), DbError> {
            removed = 0;
            for id in ids {
                if scope.remove(collection, id) {
                    removed += 1;
                }
            }
            Ok(())
        })?;
        Ok(removed)
    }
}
