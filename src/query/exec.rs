use crate::config::EngineConfig;
use crate::errors::DbError;
use crate::record::Record;
use crate::store::RecordStore;
use crate::utils::devlog::emit_bench;
use bson::Document as BsonDocument;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use super::cursor::Cursor;
use super::eval::{compare_docs, eval_filter};
use super::parse::{parse_filter, parse_sort};
use super::types::{Filter, FindOptions};

/// Read side of the engine: filter, sort and page the records of a collection.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn RecordStore>,
    config: EngineConfig,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("store_open", &self.store.is_open())
            .field("config", &self.config)
            .finish()
    }
}

impl QueryEngine {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, config: EngineConfig::default() }
    }

    /// # Errors
    /// Returns `Config` if a limit in `config` is zero.
    pub fn with_config(store: Arc<dyn RecordStore>, config: EngineConfig) -> Result<Self, DbError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Return the records of `collection` matching `filter`, sorted and paged
    /// per `opts`. An unknown collection yields an empty cursor.
    ///
    /// # Errors
    /// `InvalidExpression` for a malformed filter or sort, or a `take` above
    /// the configured limit; `StoreUnavailable` if the store is closed.
    pub fn evaluate(
        &self,
        collection: &str,
        filter: &BsonDocument,
        opts: &FindOptions,
    ) -> Result<Cursor, DbError> {
        let started = Instant::now();
        let filter = parse_filter(filter, &self.config)?;
        let sort_keys = match &opts.sort {
            Some(specs) => parse_sort(specs, &self.config)?,
            None => Vec::new(),
        };
        if let Some(take) = opts.take
            && take > self.config.max_take
        {
            return Err(DbError::invalid(format!("take {take} exceeds limit {}", self.config.max_take)));
        }

        let mut records = self.matching(collection, &filter)?;
        let matched = records.len();
        if !sort_keys.is_empty() {
            // `sort_by` is stable, so ties keep insertion order.
            records.sort_by(|a, b| compare_docs(a.data(), b.data(), &sort_keys));
        }
        let skip = opts.skip.unwrap_or(0);
        let records: Vec<Record> = match opts.take {
            Some(take) => records.into_iter().skip(skip).take(take).collect(),
            None => records.into_iter().skip(skip).collect(),
        };
        emit_bench(
            "find",
            collection,
            started,
            json!({
                "matched": matched,
                "result_count": records.len(),
                "skip": skip,
                "take": opts.take,
                "sort_keys": sort_keys.len(),
            }),
        );
        Ok(Cursor::new(records))
    }

    /// First record in result order, if any.
    ///
    /// # Errors
    /// See [`QueryEngine::evaluate`].
    pub fn find_one(
        &self,
        collection: &str,
        filter: &BsonDocument,
        opts: &FindOptions,
    ) -> Result<Option<Record>, DbError> {
        let opts = FindOptions { take: Some(1), ..opts.clone() };
        Ok(self.evaluate(collection, filter, &opts)?.next())
    }

    /// Number of matching records; sorting and paging do not apply.
    ///
    /// # Errors
    /// See [`QueryEngine::evaluate`].
    pub fn count(&self, collection: &str, filter: &BsonDocument) -> Result<u64, DbError> {
        let started = Instant::now();
        let filter = parse_filter(filter, &self.config)?;
        let n = self.matching(collection, &filter)?.len() as u64;
        emit_bench("count", collection, started, json!({ "result_count": n }));
        Ok(n)
    }

    /// # Errors
    /// See [`QueryEngine::evaluate`].
    pub fn exists(&self, collection: &str, filter: &BsonDocument) -> Result<bool, DbError> {
        let filter = parse_filter(filter, &self.config)?;
        let found = self.store.all_of(collection)?.iter().any(|r| eval_filter(r.data(), &filter));
        Ok(found)
    }

    /// Matching records in insertion order.
    pub(crate) fn matching(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>, DbError> {
        let mut records = self.store.all_of(collection)?;
        if !filter.matches_all() {
            records.retain(|r| eval_filter(r.data(), filter));
        }
        Ok(records)
    }
}
