use bson::doc;
use odmlite::Database;
use odmlite::query::FindOptions;
use odmlite::utils::devlog;

#[test]
fn every_engine_operation_emits_one_bench_line() {
    let _g = devlog::enable_thread_sink();
    let db = Database::open();
    db.create("c", doc! {"v": 1}).unwrap();
    db.find("c", &doc! {}, &FindOptions::default()).unwrap();
    db.count("c", &doc! {}).unwrap();
    db.update("c", &doc! {}, &doc! {"v": 2}).unwrap();
    db.delete("c", &doc! {}).unwrap();
    let ops: Vec<String> = devlog::drain()
        .iter()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter(|v| v["bench"] == "query")
        .map(|v| v["op"].as_str().unwrap_or_default().to_owned())
        .collect();
    assert_eq!(ops, vec!["find", "count", "update_many", "delete_many"]);
}

#[test]
fn logging_writes_app_log() {
    let dir = tempfile::tempdir().unwrap();
    // Only one global logger per process; a second init in the same binary fails.
    if odmlite::utils::logger::configure_logging_with_dev(Some(dir.path()), Some("debug"), Some(2), true).is_ok() {
        log::info!("hello from test");
        odmlite::dev6!("dev line");
        assert!(dir.path().join("app.log").exists());
        assert!(dir.path().join("dev6.log").exists());
    }
}

#[test]
fn init_from_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let res = odmlite::utils::logger::init_path(&dir.path().join("absent.yaml"));
    assert!(res.is_err());
}
