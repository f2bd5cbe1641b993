#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(update) = odmlite::query::parse_update_json(s)
    {
        let mut d = bson::doc! {"a": 1, "m": {"x": "y"}, "n": null};
        let _ = odmlite::query::apply_update(&mut d, &update);
    }
});
