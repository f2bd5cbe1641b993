#![no_main]
use libfuzzer_sys::fuzz_target;
use odmlite::query::FindOptions;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    let Ok(s) = std::str::from_utf8(data) else { return };
    let Ok(filter) = odmlite::utils::json::parse_json_document(s) else { return };
    let db = odmlite::Database::open();
    for d in [
        bson::doc! {"a": 1, "b": 2, "name": "x"},
        bson::doc! {"a": 10, "b": -5, "name": "y", "nested": {"z": 3}},
        bson::doc! {"active": true, "tags": ["p", "q"], "n": null},
    ] {
        let _ = db.create("f", d);
    }
    let opts = FindOptions::default().sort("a", odmlite::query::Order::Desc).sort("name", odmlite::query::Order::Asc);
    let _ = db.find("f", &filter, &opts);
    let _ = db.count("f", &filter);
    let _ = db.delete("f", &filter);
});
