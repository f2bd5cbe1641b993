use crate::config::EngineConfig;
use crate::errors::DbError;
use crate::types::ID_FIELD;
use crate::utils::json::parse_json_document;
use bson::{Bson, Document as BsonDocument};

use super::path::FieldPath;
use super::types::{Clause, CmpOp, Filter, Order, Predicate, SortKey, SortSpec, UpdateDoc};

/// Parse a filter expression: `{path: literal}` for equality or
/// `{path: {$op: operand, ...}}` with `$gt $gte $lt $lte $in $nin $exists`.
///
/// # Errors
/// Returns `InvalidExpression` naming the offending path or operator.
pub fn parse_filter(expr: &BsonDocument, cfg: &EngineConfig) -> Result<Filter, DbError> {
    let mut clauses = Vec::with_capacity(expr.len());
    for (key, value) in expr {
        if key.starts_with('$') {
            return Err(DbError::invalid(format!("unsupported top-level operator '{key}'")));
        }
        let path = FieldPath::parse(key, cfg.max_path_depth)?;
        let predicates = if let Bson::Document(ops) = value
            && is_operator_object(key, ops)?
        {
            parse_operators(key, ops, cfg)?
        } else {
            vec![Predicate::Eq(value.clone())]
        };
        clauses.push(Clause { path, predicates });
    }
    Ok(Filter { clauses })
}

/// A sub-document is an operator object when all of its keys start with `$`;
/// a sub-document with none is a literal for equality.
fn is_operator_object(path: &str, d: &BsonDocument) -> Result<bool, DbError> {
    let ops = d.keys().filter(|k| k.starts_with('$')).count();
    if ops == 0 {
        return Ok(false);
    }
    if ops != d.len() {
        return Err(DbError::invalid(format!("'{path}' mixes operators and plain fields")));
    }
    Ok(true)
}

fn parse_operators(path: &str, ops: &BsonDocument, cfg: &EngineConfig) -> Result<Vec<Predicate>, DbError> {
    ops.iter()
        .map(|(op, operand)| {
            let cmp = |op: CmpOp| Predicate::Cmp { op, value: operand.clone() };
            Ok(match op.as_str() {
                "$gt" => cmp(CmpOp::Gt),
                "$gte" => cmp(CmpOp::Gte),
                "$lt" => cmp(CmpOp::Lt),
                "$lte" => cmp(CmpOp::Lte),
                "$in" => Predicate::In(operand_list(path, op, operand, cfg)?),
                "$nin" => Predicate::Nin(operand_list(path, op, operand, cfg)?),
                "$exists" => Predicate::Exists(truthy(path, operand)?),
                other => {
                    return Err(DbError::invalid(format!("unknown operator '{other}' on '{path}'")));
                }
            })
        })
        .collect()
}

fn operand_list(path: &str, op: &str, operand: &Bson, cfg: &EngineConfig) -> Result<Vec<Bson>, DbError> {
    match operand {
        Bson::Array(items) if items.len() <= cfg.max_in_set => Ok(items.clone()),
        Bson::Array(items) => Err(DbError::invalid(format!(
            "{op} on '{path}' has {} values, limit is {}",
            items.len(),
            cfg.max_in_set
        ))),
        _ => Err(DbError::invalid(format!("{op} on '{path}' requires an array"))),
    }
}

fn truthy(path: &str, operand: &Bson) -> Result<bool, DbError> {
    match operand {
        Bson::Boolean(b) => Ok(*b),
        Bson::Int32(i) => Ok(*i != 0),
        Bson::Int64(i) => Ok(*i != 0),
        Bson::Double(f) => Ok(*f != 0.0),
        _ => Err(DbError::invalid(format!("$exists on '{path}' requires a boolean"))),
    }
}

/// Parse an update expression. Either every key is a field path (each
/// assigned wholesale at its leaf), or every key is one of `$set`, `$unset`,
/// `$inc`.
///
/// # Errors
/// Returns `InvalidExpression` for unknown or mixed operators, malformed
/// paths, non-numeric `$inc` operands, or any attempt to change `_id`.
pub fn parse_update(expr: &BsonDocument, cfg: &EngineConfig) -> Result<UpdateDoc, DbError> {
    let mut out = UpdateDoc::default();
    let ops = expr.keys().filter(|k| k.starts_with('$')).count();
    if ops == 0 {
        for (k, v) in expr {
            out.set.push((update_path(k, cfg)?, v.clone()));
        }
        return Ok(out);
    }
    if ops != expr.len() {
        return Err(DbError::invalid("update mixes operators and plain fields"));
    }
    for (op, operand) in expr {
        match op.as_str() {
            "$set" => {
                for (k, v) in operand_doc(op, operand)? {
                    out.set.push((update_path(k, cfg)?, v.clone()));
                }
            }
            "$inc" | "$mul" => {
                for (k, v) in operand_doc(op, operand)? {
                    if !matches!(v, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) {
                        return Err(DbError::invalid(format!("{op} on '{k}' requires a number")));
                    }
                    let entry = (update_path(k, cfg)?, v.clone());
                    if op == "$inc" {
                        out.inc.push(entry);
                    } else {
                        out.mul.push(entry);
                    }
                }
            }
            "$rename" => {
                for (k, v) in operand_doc(op, operand)? {
                    let Bson::String(to) = v else {
                        return Err(DbError::invalid(format!("$rename target for '{k}' must be a string")));
                    };
                    let from = update_path(k, cfg)?;
                    let to = update_path(to, cfg)?;
                    if overlaps(&from, &to) {
                        return Err(DbError::invalid(format!("$rename '{from}' to '{to}' overlaps itself")));
                    }
                    out.rename.push((from, to));
                }
            }
            "$unset" => match operand {
                Bson::Document(d) => {
                    for k in d.keys() {
                        out.unset.push(update_path(k, cfg)?);
                    }
                }
                Bson::Array(items) => {
                    for item in items {
                        let Bson::String(k) = item else {
                            return Err(DbError::invalid("$unset list entries must be strings"));
                        };
                        out.unset.push(update_path(k, cfg)?);
                    }
                }
                _ => return Err(DbError::invalid("$unset requires a document or list of paths")),
            },
            other => return Err(DbError::invalid(format!("unknown update operator '{other}'"))),
        }
    }
    Ok(out)
}

fn operand_doc<'a>(op: &str, operand: &'a Bson) -> Result<&'a BsonDocument, DbError> {
    match operand {
        Bson::Document(d) => Ok(d),
        _ => Err(DbError::invalid(format!("{op} requires a document"))),
    }
}

/// True if one path equals or lies under the other.
fn overlaps(a: &FieldPath, b: &FieldPath) -> bool {
    a.segments().iter().zip(b.segments()).all(|(x, y)| x == y)
}

fn update_path(raw: &str, cfg: &EngineConfig) -> Result<FieldPath, DbError> {
    let path = FieldPath::parse(raw, cfg.max_path_depth)?;
    if path.root() == ID_FIELD {
        return Err(DbError::invalid(format!("'{raw}' is immutable")));
    }
    Ok(path)
}

pub(crate) fn parse_sort(specs: &[SortSpec], cfg: &EngineConfig) -> Result<Vec<SortKey>, DbError> {
    if specs.len() > cfg.max_sort_fields {
        return Err(DbError::invalid(format!(
            "sort has {} keys, limit is {}",
            specs.len(),
            cfg.max_sort_fields
        )));
    }
    specs
        .iter()
        .map(|s| Ok(SortKey { path: FieldPath::parse(&s.field, cfg.max_path_depth)?, order: s.order }))
        .collect()
}

/// # Errors
/// Returns an error if the JSON is not an object or is not a valid filter.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    parse_filter(&parse_json_document(json)?, &EngineConfig::default())
}

/// # Errors
/// Returns an error if the JSON is not an object or is not a valid update.
pub fn parse_update_json(json: &str) -> Result<UpdateDoc, DbError> {
    parse_update(&parse_json_document(json)?, &EngineConfig::default())
}

/// Parse `{"name": "ASC", "age": "DESC"}` into sort keys, keeping declaration order.
///
/// # Errors
/// Returns `InvalidExpression` if a direction is not `ASC`/`DESC`.
pub fn parse_sort_json(json: &str) -> Result<Vec<SortSpec>, DbError> {
    parse_json_document(json)?
        .into_iter()
        .map(|(field, dir)| {
            let order = match dir {
                Bson::String(s) if s.eq_ignore_ascii_case("asc") => Order::Asc,
                Bson::String(s) if s.eq_ignore_ascii_case("desc") => Order::Desc,
                Bson::Int32(1) | Bson::Int64(1) => Order::Asc,
                Bson::Int32(-1) | Bson::Int64(-1) => Order::Desc,
                other => {
                    return Err(DbError::invalid(format!("bad sort direction {other} for '{field}'")));
                }
            };
            Ok(SortSpec { field, order })
        })
        .collect()
}
