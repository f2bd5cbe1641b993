use crate::config::EngineConfig;
use crate::errors::DbError;
use crate::record::Record;
use crate::store::{RecordStore, WriteScope};
use crate::types::{RecordId, UPDATED_AT_FIELD};
use crate::utils::devlog::emit_bench;
use bson::{Bson, Document as BsonDocument};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use super::exec::QueryEngine;
use super::parse::{parse_filter, parse_update};
use super::path::{FieldPath, Lookup, resolve, set_path, take_path, unset_path};
use super::types::UpdateDoc;

/// Write side of the engine: bulk update and delete over filter matches.
#[derive(Debug, Clone)]
pub struct MutationEngine {
    query: QueryEngine,
}

impl MutationEngine {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { query: QueryEngine::new(store) }
    }

    /// # Errors
    /// Returns `Config` if a limit in `config` is zero.
    pub fn with_config(store: Arc<dyn RecordStore>, config: EngineConfig) -> Result<Self, DbError> {
        Ok(Self { query: QueryEngine::with_config(store, config)? })
    }

    #[must_use]
    pub const fn from_query(query: QueryEngine) -> Self {
        Self { query }
    }

    #[must_use]
    pub const fn query(&self) -> &QueryEngine {
        &self.query
    }

    /// Apply `update` to every record matching `filter` in one write scope and
    /// stamp `updatedAt`. Returns the number of targets, changed or not.
    ///
    /// # Errors
    /// `InvalidExpression` for malformed expressions (raised before any write),
    /// `TypeMismatch` from `$inc` or `$mul` (the whole call is rolled back),
    /// `StoreUnavailable` if the store is closed.
    pub fn update_many(
        &self,
        collection: &str,
        filter: &BsonDocument,
        update: &BsonDocument,
    ) -> Result<u64, DbError> {
        let started = Instant::now();
        let cfg = self.query.config();
        let filter = parse_filter(filter, cfg)?;
        let update = parse_update(update, cfg)?;
        let targets = ids_of(self.query.matching(collection, &filter)?);
        let now = Bson::DateTime(bson::DateTime::now());

        let mut updated = 0u64;
        let mut modified = 0u64;
        self.query.store().with_write_scope(&mut |scope: &mut dyn WriteScope| -> Result<(), DbError> {
            updated = 0;
            modified = 0;
            for id in &targets {
                let Some(record) = scope.get_mut(collection, id) else { continue };
                if apply_update(record.data_mut(), &update)? {
                    modified += 1;
                }
                record.data_mut().insert(UPDATED_AT_FIELD, now.clone());
                updated += 1;
            }
            Ok(())
        })?;
        log::debug!("update_many on {collection}: {updated} updated, {modified} changed");
        emit_bench(
            "update_many",
            collection,
            started,
            json!({ "matched": targets.len(), "updated": updated, "modified": modified }),
        );
        Ok(updated)
    }

    /// Remove every record matching `filter` in one write scope.
    ///
    /// # Errors
    /// `InvalidExpression` for a malformed filter, `StoreUnavailable` if the
    /// store is closed.
    pub fn delete_many(&self, collection: &str, filter: &BsonDocument) -> Result<u64, DbError> {
        let started = Instant::now();
        let filter = parse_filter(filter, self.query.config())?;
        let targets = ids_of(self.query.matching(collection, &filter)?);
        let deleted = self.query.store().delete(collection, &targets)?;
        log::debug!("delete_many on {collection}: {deleted} removed");
        emit_bench("delete_many", collection, started, json!({ "deleted": deleted }));
        Ok(deleted)
    }
}

fn ids_of(records: Vec<Record>) -> Vec<RecordId> {
    records.into_iter().map(|r| r.id().clone()).collect()
}

/// Apply a parsed update to a document: `$set`, `$inc`, `$mul`, `$rename`,
/// then `$unset`. Returns true if any stored value changed.
///
/// # Errors
/// `TypeMismatch` if an `$inc` or `$mul` target holds a non-numeric value or
/// `null`; `InvalidExpression` if a path indexes past the end of an array.
pub fn apply_update(data: &mut BsonDocument, update: &UpdateDoc) -> Result<bool, DbError> {
    let mut changed = false;
    for (path, value) in &update.set {
        changed |= set_path(data, path, value.clone())?;
    }
    for (path, by) in &update.inc {
        let next = combine(path, resolve(data, path), by, i64::checked_add, |a, b| a + b)?;
        changed |= set_path(data, path, next)?;
    }
    for (path, by) in &update.mul {
        let next = combine(path, resolve(data, path), by, i64::checked_mul, |a, b| a * b)?;
        changed |= set_path(data, path, next)?;
    }
    for (from, to) in &update.rename {
        if let Some(value) = take_path(data, from) {
            set_path(data, to, value)?;
            changed = true;
        }
    }
    for path in &update.unset {
        changed |= unset_path(data, path);
    }
    Ok(changed)
}

static ZERO: Bson = Bson::Int32(0);

/// Int32 with Int32 stays Int32 unless the result overflows; integer results
/// otherwise widen to Int64; any Double operand gives a Double. Absent counts
/// as 0.
fn combine(
    path: &FieldPath,
    current: Lookup<'_>,
    by: &Bson,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Bson, DbError> {
    let mismatch = || DbError::TypeMismatch { path: path.to_string(), expected: "number" };
    let current = current.value().unwrap_or(&ZERO);
    Ok(match (current, by) {
        (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
            let n = int(as_i64(current), as_i64(by)).ok_or_else(mismatch)?;
            match (current, by) {
                (Bson::Int32(_), Bson::Int32(_)) => i32::try_from(n).map_or(Bson::Int64(n), Bson::Int32),
                _ => Bson::Int64(n),
            }
        }
        (Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_), Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => {
            Bson::Double(float(as_f64(current), as_f64(by)))
        }
        _ => return Err(mismatch()),
    })
}

fn as_i64(v: &Bson) -> i64 {
    match v {
        Bson::Int32(i) => i64::from(*i),
        Bson::Int64(i) => *i,
        _ => 0,
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(v: &Bson) -> f64 {
    match v {
        Bson::Double(f) => *f,
        other => as_i64(other) as f64,
    }
}
