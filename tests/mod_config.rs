use odmlite::config::{DEFAULT_MAX_PATH_DEPTH, EngineConfig};
use odmlite::errors::DbError;
use odmlite::query::FindOptions;
use odmlite::Database;
use bson::doc;
use std::io::Write;

#[test]
fn load_from_toml_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "max_in_set = 2\nmax_sort_fields = 1").unwrap();
    let cfg = EngineConfig::load(f.path()).unwrap();
    assert_eq!(cfg.max_in_set, 2);
    assert_eq!(cfg.max_path_depth, DEFAULT_MAX_PATH_DEPTH);

    let db = Database::open_with_config(cfg).unwrap();
    assert!(matches!(
        db.count("c", &doc! {"a": {"$in": [1, 2, 3]}}),
        Err(DbError::InvalidExpression(_))
    ));
    let two_keys = FindOptions::default().sort("a", odmlite::query::Order::Asc).sort("b", odmlite::query::Order::Asc);
    assert!(db.find("c", &doc! {}, &two_keys).is_err());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(EngineConfig::load(&dir.path().join("absent.toml")), Err(DbError::Io(_))));
}

#[test]
fn path_depth_limit() {
    let cfg = EngineConfig { max_path_depth: 2, ..EngineConfig::default() };
    let db = Database::open_with_config(cfg).unwrap();
    assert!(db.count("c", &doc! {"a.b": 1}).is_ok());
    assert!(db.count("c", &doc! {"a.b.c": 1}).is_err());
}
