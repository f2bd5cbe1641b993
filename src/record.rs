use crate::errors::DbError;
use crate::types::{CREATED_AT_FIELD, ID_FIELD, RecordId, UPDATED_AT_FIELD};
use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

/// A schema-less document owned by a record store.
///
/// The document always carries a string `_id`; `id` caches it. Stores hand out
/// clones for reads and `&mut Record` only from inside a write scope.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    data: BsonDocument,
}

impl Record {
    /// Wrap a stored document, reading its identifier from `_id`.
    ///
    /// # Errors
    /// Returns `InvalidExpression` if `_id` is missing or not a string.
    pub fn from_document(data: BsonDocument) -> Result<Self, DbError> {
        let id = match data.get(ID_FIELD) {
            Some(Bson::String(s)) => RecordId(s.clone()),
            Some(other) => {
                return Err(DbError::invalid(format!(
                    "{ID_FIELD} must be a string, got {:?}",
                    other.element_type()
                )));
            }
            None => return Err(DbError::invalid(format!("record is missing {ID_FIELD}"))),
        };
        Ok(Self { id, data })
    }

    #[must_use]
    pub const fn id(&self) -> &RecordId {
        &self.id
    }

    #[must_use]
    pub const fn data(&self) -> &BsonDocument {
        &self.data
    }

    /// Mutable access to the fields. `_id` must not be rewritten through this.
    pub const fn data_mut(&mut self) -> &mut BsonDocument {
        &mut self.data
    }

    #[must_use]
    pub fn into_data(self) -> BsonDocument {
        self.data
    }

    #[must_use]
    pub fn created_at(&self) -> Option<bson::DateTime> {
        self.timestamp(CREATED_AT_FIELD)
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<bson::DateTime> {
        self.timestamp(UPDATED_AT_FIELD)
    }

    fn timestamp(&self, field: &str) -> Option<bson::DateTime> {
        match self.data.get(field) {
            Some(Bson::DateTime(dt)) => Some(*dt),
            _ => None,
        }
    }
}
