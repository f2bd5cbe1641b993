//! Seeds an in-memory store with factory data and times the engine operations.
//!
//! Usage: `benchmark_query [documents]` (default 10 000).

use bson::doc;
use odmlite::Database;
use odmlite::factory::{DOCUMENTS, FOLDERS, TestDataFactory, USERS};
use odmlite::query::{FindOptions, Order};
use std::time::Instant;

fn timed<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    println!("{label:<28} {:>10.3} ms", start.elapsed().as_secs_f64() * 1000.0);
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    odmlite::utils::logger::configure_from_env().unwrap_or_else(|e| eprintln!("logging disabled: {e}"));
    let total: usize = std::env::args().nth(1).map_or(Ok(10_000), |s| s.parse())?;

    let db = Database::open();
    let owner = db.create(USERS, TestDataFactory::user(doc! {}))?;
    let folder = db.create(FOLDERS, TestDataFactory::folder(owner.id(), doc! {}))?;
    let docs = TestDataFactory::documents(total, owner.id(), folder.id(), &doc! {});
    timed(&format!("insert {total}"), || -> Result<(), odmlite::errors::DbError> {
        for (i, mut d) in docs.into_iter().enumerate() {
            if i % 3 == 0 {
                d.insert("metadata", doc! {"status": "review", "priority": i64::try_from(i).unwrap_or(0)});
            }
            db.create(DOCUMENTS, d)?;
        }
        Ok(())
    })?;

    let drafts = timed("find draft", || db.find(DOCUMENTS, &doc! {"metadata.status": "draft"}, &FindOptions::default()))?;
    println!("  -> {} drafts", drafts.len());
    let opts = FindOptions::default().sort("name", Order::Asc).skip(100).take(50);
    timed("find sorted page", || db.find(DOCUMENTS, &doc! {}, &opts))?;
    let n = timed("count priority exists", || {
        db.count(DOCUMENTS, &doc! {"metadata.priority": {"$exists": true}})
    })?;
    println!("  -> {n} with priority");
    let n = timed("update draft -> review", || {
        db.update(DOCUMENTS, &doc! {"metadata.status": "draft"}, &doc! {"metadata.status": "review"})
    })?;
    println!("  -> {n} updated");
    let n = timed("delete priority < 300", || db.delete(DOCUMENTS, &doc! {"metadata.priority": {"$lt": 300}}))?;
    println!("  -> {n} deleted");
    Ok(())
}
