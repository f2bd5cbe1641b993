//! Realistic seed records for tests and benchmarks: users, folders and documents.
//!
//! Every builder takes an `overrides` document whose top-level keys replace the
//! generated defaults.

use crate::types::RecordId;
use bson::{Bson, Document as BsonDocument, doc};
use fake::Fake;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use rand::Rng;

pub const USERS: &str = "users";
pub const FOLDERS: &str = "folders";
pub const DOCUMENTS: &str = "documents";

/// Start of the window random timestamps are drawn from.
const EPOCH_YEAR: i32 = 2020;

#[derive(Debug, Clone, Copy, Default)]
pub struct TestDataFactory;

impl TestDataFactory {
    fn window_start_ms() -> i64 {
        chrono::NaiveDate::from_ymd_opt(EPOCH_YEAR, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(0, |dt| dt.and_utc().timestamp_millis())
    }

    /// Random instant between `start_ms` and now.
    fn date_after(start_ms: i64) -> bson::DateTime {
        let end = chrono::Utc::now().timestamp_millis().max(start_ms);
        bson::DateTime::from_millis(rand::rng().random_range(start_ms..=end))
    }

    /// `(createdAt, updatedAt)` with `updatedAt >= createdAt`.
    fn timestamps() -> (bson::DateTime, bson::DateTime) {
        let created = Self::date_after(Self::window_start_ms());
        (created, Self::date_after(created.timestamp_millis()))
    }

    fn unique_name(prefix: &str) -> String {
        format!("{prefix}-{}", RecordId::new())
    }

    fn overlay(mut base: BsonDocument, overrides: BsonDocument) -> BsonDocument {
        for (k, v) in overrides {
            base.insert(k, v);
        }
        base
    }

    #[must_use]
    pub fn user(overrides: BsonDocument) -> BsonDocument {
        let (created, updated) = Self::timestamps();
        let display: String = Name().fake();
        let base = doc! {
            "name": Self::unique_name("User"),
            "displayName": display,
            "email": format!("user-{}@example.com", RecordId::new()),
            "age": rand::rng().random_range(18..=65_i32),
            "active": true,
            "createdAt": created,
            "updatedAt": updated,
        };
        Self::overlay(base, overrides)
    }

    #[must_use]
    pub fn folder(owner_id: &RecordId, overrides: BsonDocument) -> BsonDocument {
        let (created, updated) = Self::timestamps();
        let name = Self::unique_name("Folder");
        let base = doc! {
            "path": format!("/{name}"),
            "name": name,
            "ownerId": owner_id.as_str(),
            "parentId": Bson::Null,
            "createdAt": created,
            "updatedAt": updated,
        };
        Self::overlay(base, overrides)
    }

    #[must_use]
    pub fn document(owner_id: &RecordId, folder_id: &RecordId, overrides: BsonDocument) -> BsonDocument {
        let (created, updated) = Self::timestamps();
        let mut rng = rand::rng();
        let content: String = Sentence(4..12).fake();
        let base = doc! {
            "name": Self::unique_name("Document"),
            "content": content,
            "ownerId": owner_id.as_str(),
            "folderId": folder_id.as_str(),
            "tags": ["test"],
            "metadata": {
                "fileSize": 1024,
                "fileType": "txt",
                "lastModified": Self::date_after(created.timestamp_millis()),
                "version": "1.0",
                "status": "draft",
            },
            "location": {
                "type": "Point",
                "coordinates": [rng.random_range(-180.0..180.0), rng.random_range(-90.0..90.0)],
            },
            "createdAt": created,
            "updatedAt": updated,
        };
        Self::overlay(base, overrides)
    }

    #[must_use]
    pub fn users(count: usize, overrides: &BsonDocument) -> Vec<BsonDocument> {
        (0..count).map(|_| Self::user(overrides.clone())).collect()
    }

    #[must_use]
    pub fn folders(count: usize, owner_id: &RecordId, overrides: &BsonDocument) -> Vec<BsonDocument> {
        (0..count).map(|_| Self::folder(owner_id, overrides.clone())).collect()
    }

    #[must_use]
    pub fn documents(
        count: usize,
        owner_id: &RecordId,
        folder_id: &RecordId,
        overrides: &BsonDocument,
    ) -> Vec<BsonDocument> {
        (0..count).map(|_| Self::document(owner_id, folder_id, overrides.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_defaults_and_overrides() {
        let u = TestDataFactory::user(doc! {"age": 30, "role": "admin"});
        assert!(u.get_str("name").unwrap().starts_with("User-"));
        assert!(u.get_str("email").unwrap().ends_with("@example.com"));
        assert_eq!(u.get_i32("age").unwrap(), 30);
        assert_eq!(u.get_str("role").unwrap(), "admin");
        let created = u.get_datetime("createdAt").unwrap();
        let updated = u.get_datetime("updatedAt").unwrap();
        assert!(updated >= created);
    }

    #[test]
    fn random_age_is_in_range() {
        for u in TestDataFactory::users(50, &doc! {}) {
            let age = u.get_i32("age").unwrap();
            assert!((18..=65).contains(&age));
        }
    }

    #[test]
    fn folder_path_follows_name() {
        let owner = RecordId::new();
        let f = TestDataFactory::folder(&owner, doc! {});
        assert_eq!(f.get_str("path").unwrap(), format!("/{}", f.get_str("name").unwrap()));
        assert_eq!(f.get_str("ownerId").unwrap(), owner.as_str());
        assert_eq!(f.get("parentId"), Some(&Bson::Null));
    }

    #[test]
    fn document_metadata_and_location() {
        let (o, f) = (RecordId::new(), RecordId::new());
        let docs = TestDataFactory::documents(3, &o, &f, &doc! {"tags": ["x"]});
        assert_eq!(docs.len(), 3);
        let d = &docs[0];
        let meta = d.get_document("metadata").unwrap();
        assert_eq!(meta.get_str("status").unwrap(), "draft");
        assert_eq!(meta.get_i32("fileSize").unwrap(), 1024);
        assert_eq!(d.get_array("tags").unwrap(), &vec![Bson::String("x".into())]);
        let coords = d.get_document("location").unwrap().get_array("coordinates").unwrap();
        let lon = coords[0].as_f64().unwrap();
        assert!((-180.0..180.0).contains(&lon));
        assert_ne!(docs[0].get_str("name").unwrap(), docs[1].get_str("name").unwrap());
    }
}
