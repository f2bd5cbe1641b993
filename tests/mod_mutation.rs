use bson::{Bson, doc};
use odmlite::Database;
use odmlite::errors::DbError;
use odmlite::query::FindOptions;

#[test]
fn single_key_update_replaces_wholesale() {
    let db = Database::open();
    db.create("c", doc! {"meta": {"a": 1, "b": 2}}).unwrap();
    db.update("c", &doc! {}, &doc! {"meta": {"a": 5}}).unwrap();
    let r = db.find_one("c", &doc! {}).unwrap().unwrap();
    assert_eq!(r.data().get_document("meta").unwrap(), &doc! {"a": 5});
}

#[test]
fn nested_update_merges_and_creates_parents() {
    let db = Database::open();
    db.create("c", doc! {"meta": {"a": 1, "b": 2}, "flat": 3}).unwrap();
    db.update("c", &doc! {}, &doc! {"meta.a": 9, "flat.x": 1, "new.deep.leaf": true}).unwrap();
    let r = db.find_one("c", &doc! {}).unwrap().unwrap();
    assert_eq!(r.data().get_document("meta").unwrap(), &doc! {"a": 9, "b": 2});
    assert_eq!(r.data().get_document("flat").unwrap(), &doc! {"x": 1});
    assert_eq!(r.data().get_document("new").unwrap(), &doc! {"deep": {"leaf": true}});
}

#[test]
fn update_stamps_updated_at_but_keeps_identity() {
    let db = Database::open();
    let old = bson::DateTime::from_millis(0);
    let created = db.create("c", doc! {"updatedAt": old, "createdAt": old, "v": 1}).unwrap();
    db.update("c", &doc! {"v": 1}, &doc! {"v": 2}).unwrap();
    let r = db.find_one("c", &doc! {}).unwrap().unwrap();
    assert_eq!(r.id(), created.id());
    assert_eq!(r.created_at(), Some(old));
    assert!(r.updated_at().unwrap() > old);
}

#[test]
fn no_match_updates_nothing() {
    let db = Database::open();
    db.create("c", doc! {"v": 1}).unwrap();
    assert_eq!(db.update("c", &doc! {"v": 2}, &doc! {"v": 3}).unwrap(), 0);
    assert_eq!(db.update("missing", &doc! {}, &doc! {"v": 3}).unwrap(), 0);
}

#[test]
fn operator_updates() {
    let db = Database::open();
    db.create("c", doc! {"n": 1, "gone": true, "m": {"x": 1}}).unwrap();
    db.update("c", &doc! {}, &doc! {"$inc": {"n": 2, "m.hits": 1}, "$unset": ["gone"], "$set": {"m.y": "z"}})
        .unwrap();
    let r = db.find_one("c", &doc! {}).unwrap().unwrap();
    assert_eq!(r.data().get("n"), Some(&Bson::Int32(3)));
    assert!(r.data().get("gone").is_none());
    assert_eq!(r.data().get_document("m").unwrap(), &doc! {"x": 1, "hits": 1, "y": "z"});
}

#[test]
fn id_is_immutable() {
    let db = Database::open();
    db.create("c", doc! {"_id": "keep"}).unwrap();
    assert!(matches!(db.update("c", &doc! {}, &doc! {"_id": "other"}), Err(DbError::InvalidExpression(_))));
    assert!(db.exists("c", &doc! {"_id": "keep"}).unwrap());
}

#[test]
fn delete_then_evaluate_is_empty() {
    let db = Database::open();
    for i in 0..6 {
        db.create("c", doc! {"i": i, "even": i % 2 == 0}).unwrap();
    }
    assert_eq!(db.delete("c", &doc! {"even": true}).unwrap(), 3);
    assert!(db.find("c", &doc! {"even": true}, &FindOptions::default()).unwrap().is_empty());
    assert_eq!(db.count("c", &doc! {}).unwrap(), 3);
}

#[test]
fn indexed_update_keeps_arrays() {
    let db = Database::open();
    db.create("c", doc! {"k": 0, "tags": ["a", "b"], "items": [{"q": 1, "r": 0}]}).unwrap();
    db.create("c", doc! {"k": 1, "tags": ["c"]}).unwrap();
    db.update("c", &doc! {"k": 0}, &doc! {"tags.0": "z", "items.0.q": 2}).unwrap();
    let r = db.find_one("c", &doc! {"k": 0}).unwrap().unwrap();
    assert_eq!(r.data().get_array("tags").unwrap(), &vec![Bson::from("z"), Bson::from("b")]);
    assert_eq!(r.data().get_array("items").unwrap(), &vec![Bson::from(doc! {"q": 2, "r": 0})]);

    db.update("c", &doc! {"k": 0}, &doc! {"$unset": ["tags.1"]}).unwrap();
    let r = db.find_one("c", &doc! {"k": 0}).unwrap().unwrap();
    assert_eq!(r.data().get_array("tags").unwrap(), &vec![Bson::from("z"), Bson::Null]);
}

#[test]
fn out_of_range_index_rolls_back_every_target() {
    let db = Database::open();
    db.create("c", doc! {"k": 0, "tags": ["a", "b", "c"]}).unwrap();
    db.create("c", doc! {"k": 1, "tags": ["d"]}).unwrap();
    let before = db.find("c", &doc! {}, &FindOptions::default()).unwrap();
    let res = db.update("c", &doc! {}, &doc! {"tags.2": "x"});
    assert!(matches!(res, Err(DbError::InvalidExpression(_))));
    assert_eq!(db.find("c", &doc! {}, &FindOptions::default()).unwrap(), before);
}

#[test]
fn mul_and_rename_updates() {
    let db = Database::open();
    db.create("c", doc! {"price": 4, "qty": 2.5, "legacy": "v1"}).unwrap();
    db.update("c", &doc! {}, &doc! {"$mul": {"price": 3, "qty": 2}, "$rename": {"legacy": "meta.version"}})
        .unwrap();
    let r = db.find_one("c", &doc! {}).unwrap().unwrap();
    assert_eq!(r.data().get("price"), Some(&Bson::Int32(12)));
    assert_eq!(r.data().get("qty"), Some(&Bson::Double(5.0)));
    assert!(r.data().get("legacy").is_none());
    assert_eq!(r.data().get_document("meta").unwrap(), &doc! {"version": "v1"});
    assert!(matches!(db.update("c", &doc! {}, &doc! {"$push": {"tags": "x"}}), Err(DbError::InvalidExpression(_))));
}
