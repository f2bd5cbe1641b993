//! Developer logging with a custom "level 6" and a thread-local sink for deterministic tests.
//! This avoids global logger races and enables asserting on logs in unit/prop tests.

use std::cell::RefCell;
use std::time::Instant;

/// Log target the `dev6!` macro writes to; `configure_logging_with_dev` routes it to `dev6.log`.
pub const DEV6_TARGET: &str = "odmlite::dev6";

thread_local! {
    static TL_SINK: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Guard that disables the thread-local sink on drop.
pub struct DevSinkGuard;
impl Drop for DevSinkGuard {
    fn drop(&mut self) {
        TL_SINK.with(|s| *s.borrow_mut() = None);
    }
}

/// Enable the thread-local sink for the current thread. Returns a guard that will disable it on drop.
pub fn enable_thread_sink() -> DevSinkGuard {
    TL_SINK.with(|s| *s.borrow_mut() = Some(Vec::new()));
    DevSinkGuard
}

/// Push a message into the thread-local sink if enabled.
pub fn write_str(msg: &str) {
    TL_SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(msg.to_owned());
        }
    });
}

/// Drain and return the captured messages for the current thread. If disabled, returns an empty vec.
pub fn drain() -> Vec<String> {
    TL_SINK.with(|s| match s.borrow_mut().as_mut() {
        Some(buf) => {
            let out = buf.clone();
            buf.clear();
            out
        }
        None => Vec::new(),
    })
}

/// Peek at the current captured messages without clearing them.
pub fn snapshot() -> Vec<String> {
    TL_SINK.with(|s| s.borrow().as_ref().cloned().unwrap_or_default())
}

/// Emit a developer log (level 6) and capture it in the thread-local sink if enabled.
#[macro_export]
macro_rules! dev6 {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        $crate::utils::devlog::write_str(&__s);
        // Also route through the global logger at TRACE with a dedicated target for optional file logging
        log::log!(target: $crate::utils::devlog::DEV6_TARGET, log::Level::Trace, "{}", __s);
    }};
}

/// Emit one benchmark line: `{"bench":"query","op":..,"collection":..,"duration_ms":..}`
/// merged with the extra `fields` object.
pub fn emit_bench(op: &str, collection: &str, started: Instant, fields: serde_json::Value) {
    let mut line = serde_json::json!({
        "bench": "query",
        "op": op,
        "collection": collection,
        "duration_ms": u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    });
    if let (Some(obj), serde_json::Value::Object(extra)) = (line.as_object_mut(), fields) {
        obj.extend(extra);
    }
    crate::dev6!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_local_sink_captures_messages() {
        let _g = enable_thread_sink();
        crate::dev6!("alpha {}", 1);
        crate::dev6!("beta");
        let snap = snapshot();
        assert!(snap.iter().any(|s| s.contains("alpha 1")));
        assert!(snap.iter().any(|s| s.contains("beta")));
        let drained = drain();
        assert!(drained.len() >= 2);
        assert!(snapshot().is_empty());
    }

    #[test]
    fn isolation_between_threads() {
        let _g = enable_thread_sink();
        crate::dev6!("main-thread");
        let handle = std::thread::spawn(|| {
            // No sink enabled in the spawned thread
            crate::dev6!("child-thread");
            snapshot()
        });
        let child_snap = handle.join().unwrap();
        assert!(child_snap.is_empty());
        let main_snap = snapshot();
        assert!(main_snap.iter().any(|s| s.contains("main-thread")));
    }

    #[test]
    fn bench_line_is_json_with_extra_fields() {
        let _g = enable_thread_sink();
        emit_bench("count", "docs", Instant::now(), serde_json::json!({"result_count": 3}));
        let lines = drain();
        assert_eq!(lines.len(), 1);
        let v: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(v["op"], "count");
        assert_eq!(v["collection"], "docs");
        assert_eq!(v["result_count"], 3);
        assert!(v["duration_ms"].is_u64());
    }
}
