use super::core::{RecordStore, ScopeFn, WriteScope};
use crate::errors::DbError;
use crate::record::Record;
use crate::types::{CREATED_AT_FIELD, CollectionName, ID_FIELD, RecordId, UPDATED_AT_FIELD};
use bson::{Bson, Document as BsonDocument, doc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Records of one collection, iterated in insertion order.
#[derive(Debug, Default, Clone)]
struct CollectionData {
    next_seq: u64,
    records: BTreeMap<u64, Record>,
    by_id: HashMap<RecordId, u64>,
}

impl CollectionData {
    fn get(&self, id: &RecordId) -> Option<&Record> {
        self.by_id.get(id).and_then(|seq| self.records.get(seq))
    }

    fn insert(&mut self, record: Record) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(record.id().clone(), seq);
        self.records.insert(seq, record);
    }

    fn replace(&mut self, record: Record) {
        if let Some(seq) = self.by_id.get(record.id()) {
            self.records.insert(*seq, record);
        }
    }

    fn remove(&mut self, id: &RecordId) {
        if let Some(seq) = self.by_id.remove(id) {
            self.records.remove(&seq);
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<CollectionName, CollectionData>,
}

impl StoreState {
    fn get(&self, collection: &str, id: &RecordId) -> Option<&Record> {
        self.collections.get(collection).and_then(|c| c.get(id))
    }
}

enum Staged {
    Put(Record),
    Removed,
}

/// Copy-on-write overlay over the committed state. Touched records are cloned
/// into `staged` and only written back on commit.
struct MemoryWriteScope<'a> {
    base: &'a StoreState,
    staged: HashMap<(CollectionName, RecordId), Staged>,
}

impl WriteScope for MemoryWriteScope<'_> {
    fn get_mut(&mut self, collection: &str, id: &RecordId) -> Option<&mut Record> {
        let key = (collection.to_owned(), id.clone());
        if !self.staged.contains_key(&key) {
            let record = self.base.get(collection, id)?.clone();
            self.staged.insert(key.clone(), Staged::Put(record));
        }
        match self.staged.get_mut(&key) {
            Some(Staged::Put(record)) => Some(record),
            _ => None,
        }
    }

    fn remove(&mut self, collection: &str, id: &RecordId) -> bool {
        let key = (collection.to_owned(), id.clone());
        let existed = match self.staged.get(&key) {
            Some(Staged::Put(_)) => true,
            Some(Staged::Removed) => false,
            None => self.base.get(collection, id).is_some(),
        };
        if existed {
            self.staged.insert(key, Staged::Removed);
        }
        existed
    }
}

/// In-process record store. Starts closed; `open` must be called before use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Option<StoreState>>,
}

impl MemoryStore {
    /// A closed store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that is already open.
    #[must_use]
    pub fn open_new() -> Self {
        let store = Self::new();
        store.open();
        store
    }

    /// Open the store. Opening an open store keeps its contents.
    pub fn open(&self) {
        let mut state = self.state.write();
        if state.is_none() {
            *state = Some(StoreState::default());
            log::info!("memory store opened");
        }
    }

    /// Close the store and drop every record.
    pub fn close(&self) {
        if self.state.write().take().is_some() {
            log::info!("memory store closed");
        }
    }

    /// Drop every record in every collection, leaving the store open.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if the store is closed.
    pub fn clear(&self) -> Result<(), DbError> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(DbError::StoreUnavailable)?;
        state.collections.clear();
        Ok(())
    }

    /// Names of collections that have ever received a record, sorted.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if the store is closed.
    pub fn collection_names(&self) -> Result<Vec<CollectionName>, DbError> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(DbError::StoreUnavailable)?;
        let mut names: Vec<_> = state.collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

fn check_timestamp(data: &BsonDocument, field: &'static str) -> Result<(), DbError> {
    match data.get(field) {
        None | Some(Bson::DateTime(_)) => Ok(()),
        Some(_) => Err(DbError::TypeMismatch { path: field.to_owned(), expected: "datetime" }),
    }
}

impl RecordStore for MemoryStore {
    fn is_open(&self) -> bool {
        self.state.read().is_some()
    }

    fn create(&self, collection: &str, data: BsonDocument) -> Result<Record, DbError> {
        check_timestamp(&data, CREATED_AT_FIELD)?;
        check_timestamp(&data, UPDATED_AT_FIELD)?;
        let now = bson::DateTime::now();
        let mut full = doc! {
            ID_FIELD: RecordId::new().0,
            CREATED_AT_FIELD: now,
            UPDATED_AT_FIELD: now,
        };
        for (k, v) in data {
            full.insert(k, v);
        }
        let record = Record::from_document(full)?;

        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(DbError::StoreUnavailable)?;
        let col = state.collections.entry(collection.to_owned()).or_default();
        if col.by_id.contains_key(record.id()) {
            return Err(DbError::DuplicateId(record.id().to_string()));
        }
        col.insert(record.clone());
        log::debug!("created {} in {collection}", record.id());
        Ok(record)
    }

    fn all_of(&self, collection: &str) -> Result<Vec<Record>, DbError> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or(DbError::StoreUnavailable)?;
        Ok(state
            .collections
            .get(collection)
            .map(|c| c.records.values().cloned().collect())
            .unwrap_or_default())
    }

    fn with_write_scope(&self, f: &mut ScopeFn<'_>) -> Result<(), DbError> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(DbError::StoreUnavailable)?;
        let staged = {
            let mut scope = MemoryWriteScope { base: &*state, staged: HashMap::new() };
            if let Err(e) = f(&mut scope) {
                log::warn!("write scope rolled back {} staged change(s): {e}", scope.staged.len());
                return Err(e);
            }
            scope.staged
        };
        for ((collection, id), change) in staged {
            let Some(col) = state.collections.get_mut(&collection) else { continue };
            match change {
                Staged::Put(record) => col.replace(record),
                Staged::Removed => col.remove(&id),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_store_is_unavailable() {
        let store = MemoryStore::new();
        assert!(!store.is_open());
        assert!(matches!(store.all_of("c"), Err(DbError::StoreUnavailable)));
        assert!(matches!(store.create("c", doc! {}), Err(DbError::StoreUnavailable)));
        let res = store.with_write_scope(&mut |_scope: &mut dyn WriteScope| -> Result<(), DbError> { Ok(()) });
        assert!(matches!(res, Err(DbError::StoreUnavailable)));
    }

    #[test]
    fn create_fills_defaults_and_keeps_caller_fields() {
        let store = MemoryStore::open_new();
        let r = store.create("users", doc! {"name": "ada"}).unwrap();
        assert!(!r.id().as_str().is_empty());
        assert!(r.created_at().is_some());
        assert_eq!(r.created_at(), r.updated_at());
        assert_eq!(r.data().get_str("name").unwrap(), "ada");
        // `_id` leads the document
        assert_eq!(r.data().keys().next().map(String::as_str), Some(ID_FIELD));

        let own = store.create("users", doc! {"_id": "u-1"}).unwrap();
        assert_eq!(own.id().as_str(), "u-1");
    }

    #[test]
    fn create_rejects_duplicate_and_bad_fields() {
        let store = MemoryStore::open_new();
        store.create("c", doc! {"_id": "x"}).unwrap();
        assert!(matches!(store.create("c", doc! {"_id": "x"}), Err(DbError::DuplicateId(id)) if id == "x"));
        // same id in another collection is fine
        store.create("d", doc! {"_id": "x"}).unwrap();
        assert!(matches!(store.create("c", doc! {"_id": 1}), Err(DbError::InvalidExpression(_))));
        assert!(matches!(
            store.create("c", doc! {"createdAt": "yesterday"}),
            Err(DbError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn all_of_preserves_insertion_order_and_unknown_is_empty() {
        let store = MemoryStore::open_new();
        for i in 0..20 {
            store.create("c", doc! {"i": i}).unwrap();
        }
        let is: Vec<i32> = store.all_of("c").unwrap().iter().map(|r| r.data().get_i32("i").unwrap()).collect();
        assert_eq!(is, (0..20).collect::<Vec<_>>());
        assert!(store.all_of("nope").unwrap().is_empty());
    }

    #[test]
    fn failed_scope_leaves_state_untouched() {
        let store = MemoryStore::open_new();
        let a = store.create("c", doc! {"v": 1}).unwrap();
        let b = store.create("c", doc! {"v": 1}).unwrap();
        let res = store.with_write_scope(&mut |scope: &mut dyn WriteScope| -> Result<(), DbError> {
            if let Some(r) = scope.get_mut("c", a.id()) {
                r.data_mut().insert("v", 2);
            }
            scope.remove("c", b.id());
            Err(DbError::invalid("boom"))
        });
        assert!(res.is_err());
        let vs: Vec<i32> = store.all_of("c").unwrap().iter().map(|r| r.data().get_i32("v").unwrap()).collect();
        assert_eq!(vs, vec![1, 1]);
    }

    #[test]
    fn committed_scope_applies_updates_and_removals() {
        let store = MemoryStore::open_new();
        let a = store.create("c", doc! {"v": 1}).unwrap();
        let b = store.create("c", doc! {"v": 1}).unwrap();
        let c = store.create("c", doc! {"v": 1}).unwrap();
        store
            .with_write_scope(&mut |scope: &mut dyn WriteScope| -> Result<(), DbError> {
                scope.get_mut("c", a.id()).unwrap().data_mut().insert("v", 5);
                assert!(scope.remove("c", b.id()));
                assert!(!scope.remove("c", b.id()));
                assert!(scope.get_mut("c", b.id()).is_none());
                Ok(())
            })
            .unwrap();
        let all = store.all_of("c").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id(), a.id());
        assert_eq!(all[0].data().get_i32("v").unwrap(), 5);
        assert_eq!(all[1].id(), c.id());
    }

    #[test]
    fn default_delete_counts_existing_only() {
        let store = MemoryStore::open_new();
        let a = store.create("c", doc! {}).unwrap();
        let n = store.delete("c", &[a.id().clone(), RecordId::from("ghost")]).unwrap();
        assert_eq!(n, 1);
        assert!(store.all_of("c").unwrap().is_empty());
    }

    #[test]
    fn clear_and_close() {
        let store = MemoryStore::open_new();
        store.create("a", doc! {}).unwrap();
        store.create("b", doc! {}).unwrap();
        assert_eq!(store.collection_names().unwrap(), vec!["a".to_string(), "b".to_string()]);
        store.clear().unwrap();
        assert!(store.collection_names().unwrap().is_empty());
        store.close();
        assert!(matches!(store.clear(), Err(DbError::StoreUnavailable)));
        store.open();
        assert!(store.is_open());
    }
}
