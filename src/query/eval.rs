use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::path::{Lookup, resolve};
use super::types::{Filter, Order, Predicate, SortKey};

#[must_use]
pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    filter.clauses.iter().all(|clause| {
        let found = resolve(doc, &clause.path);
        clause.predicates.iter().all(|p| eval_predicate(found, p))
    })
}

fn eval_predicate(found: Lookup<'_>, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq(expected) => found.value().is_some_and(|v| values_equal(v, expected)),
        Predicate::Cmp { op, value } => found
            .value()
            .and_then(|v| compare_values(v, value))
            .is_some_and(|ord| op.accepts(ord)),
        Predicate::In(set) => is_in_set(found, set),
        Predicate::Nin(set) => !is_in_set(found, set),
        Predicate::Exists(exists) => found.is_set() == *exists,
    }
}

fn is_in_set(found: Lookup<'_>, set: &[Bson]) -> bool {
    found.value().is_some_and(|v| set.iter().any(|x| values_equal(v, x)))
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(v: &Bson) -> Option<Num> {
    match v {
        Bson::Int32(i) => Some(Num::Int(i64::from(*i))),
        Bson::Int64(i) => Some(Num::Int(*i)),
        Bson::Double(f) => Some(Num::Float(*f)),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().ok().map(Num::Float),
        _ => None,
    }
}

/// 2^63 as an exact `f64`; every finite float below it (and at or above
/// `-2^63`) truncates to an in-range `i64`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison of an integer with a float; `None` only for NaN.
#[allow(clippy::cast_possible_truncation)]
fn int_float_cmp(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if f < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)),
        ord => Some(ord),
    }
}

fn num_cmp(a: Num, b: Num) -> Option<Ordering> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        (Num::Int(x), Num::Float(y)) => int_float_cmp(x, y),
        (Num::Float(x), Num::Int(y)) => int_float_cmp(y, x).map(Ordering::reverse),
        (Num::Float(x), Num::Float(y)) => x.partial_cmp(&y),
    }
}

/// Total order over numbers for sorting: NaN first, then by exact value.
fn num_sort_cmp(a: Num, b: Num) -> Ordering {
    let is_nan = |n: Num| matches!(n, Num::Float(f) if f.is_nan());
    match (is_nan(a), is_nan(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => num_cmp(a, b).unwrap_or(Ordering::Equal),
    }
}

/// Deep equality. Numbers compare by value across Int32/Int64/Double, and
/// sub-documents compare as key sets regardless of key order.
#[must_use]
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return num_cmp(x, y) == Some(Ordering::Equal);
    }
    match (a, b) {
        (Bson::Array(xs), Bson::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Bson::Document(x), Bson::Document(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Ordering used by `$gt/$gte/$lt/$lte`: numbers, dates and strings, each only
/// against its own kind. `None` means the operands are not comparable.
#[must_use]
pub fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return num_cmp(x, y);
    }
    match (a, b) {
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.timestamp_millis().cmp(&y.timestamp_millis())),
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order over all values for sorting: by type class first, then by value.
#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    let by_rank = type_rank(a).cmp(&type_rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return num_sort_cmp(x, y);
    }
    use bson::Bson as T;
    match (a, b) {
        (T::String(x), T::String(y)) | (T::Symbol(x), T::Symbol(y)) => x.cmp(y),
        (T::Boolean(x), T::Boolean(y)) => x.cmp(y),
        (T::DateTime(x), T::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
        (T::ObjectId(x), T::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (T::Timestamp(x), T::Timestamp(y)) => (x.time, x.increment).cmp(&(y.time, y.increment)),
        (T::Binary(x), T::Binary(y)) => x.bytes.cmp(&y.bytes),
        (T::Array(xs), T::Array(ys)) => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| compare_bson(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        (T::Document(x), T::Document(y)) => x
            .iter()
            .zip(y.iter())
            .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare_bson(va, vb)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => Ordering::Equal,
    }
}

fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::MinKey => 0,
        T::Null | T::Undefined => 1,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 2,
        T::String(_) | T::Symbol(_) => 3,
        T::Document(_) => 4,
        T::Array(_) => 5,
        T::Binary(_) => 6,
        T::ObjectId(_) => 7,
        T::Boolean(_) => 8,
        T::DateTime(_) => 9,
        T::Timestamp(_) => 10,
        T::RegularExpression(_) => 11,
        T::DbPointer(_) | T::JavaScriptCode(_) | T::JavaScriptCodeWithScope(_) => 12,
        T::MaxKey => 255,
    }
}

/// Multi-key record comparison. Absent sorts before any present value in
/// ascending order; `Desc` reverses the whole key.
pub(crate) fn compare_docs(a: &BsonDocument, b: &BsonDocument, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ord = match (resolve(a, &key.path), resolve(b, &key.path)) {
            (Lookup::Present(x), Lookup::Present(y)) => compare_bson(x, y),
            (Lookup::Present(_), Lookup::Absent) => Ordering::Greater,
            (Lookup::Absent, Lookup::Present(_)) => Ordering::Less,
            (Lookup::Absent, Lookup::Absent) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if key.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}
