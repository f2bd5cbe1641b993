use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument};
use std::fmt;

/// A validated dot-separated field path such as `metadata.status`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// # Errors
    /// Returns `InvalidExpression` for an empty path, an empty segment, a
    /// `$`-prefixed segment, or more than `max_depth` segments.
    pub fn parse(raw: &str, max_depth: usize) -> Result<Self, DbError> {
        if raw.is_empty() {
            return Err(DbError::invalid("empty field path"));
        }
        let segments: Vec<String> = raw.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(DbError::invalid(format!("malformed field path '{raw}'")));
        }
        if let Some(seg) = segments.iter().find(|s| s.starts_with('$')) {
            return Err(DbError::invalid(format!("operator '{seg}' is not allowed in field path '{raw}'")));
        }
        if segments.len() > max_depth {
            return Err(DbError::invalid(format!(
                "field path '{raw}' exceeds max depth {max_depth}"
            )));
        }
        Ok(Self { raw: raw.to_owned(), segments })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment; the top-level field the path addresses.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    fn split_leaf(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((leaf, parents)) => (parents, leaf.as_str()),
            None => (&[], self.raw.as_str()),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Outcome of resolving a path. `Absent` means a key was missing at some
/// level, which is not the same as an explicit `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Absent,
    Present(&'a Bson),
}

impl<'a> Lookup<'a> {
    #[must_use]
    pub const fn value(self) -> Option<&'a Bson> {
        match self {
            Self::Absent => None,
            Self::Present(v) => Some(v),
        }
    }

    #[must_use]
    pub const fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Present and not `null`.
    #[must_use]
    pub const fn is_set(self) -> bool {
        matches!(self, Self::Present(v) if !matches!(v, Bson::Null | Bson::Undefined))
    }
}

/// Descend through nested documents (and array indices) along `path`.
#[must_use]
pub fn resolve<'a>(doc: &'a BsonDocument, path: &FieldPath) -> Lookup<'a> {
    let mut segs = path.segments().iter();
    let Some(mut cur) = segs.next().and_then(|first| doc.get(first)) else {
        return Lookup::Absent;
    };
    for seg in segs {
        let next = match cur {
            Bson::Document(d) => d.get(seg),
            Bson::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(v) => cur = v,
            None => return Lookup::Absent,
        }
    }
    Lookup::Present(cur)
}

/// Assign `value` at `path`, keeping sibling keys of every parent. Missing or
/// scalar intermediates become fresh documents; an array is descended by
/// index, where the index one past the end appends. Returns true if the
/// stored value changed.
///
/// # Errors
/// `InvalidExpression` if a segment under an array is not an index in
/// `0..=len`.
pub(crate) fn set_path(root: &mut BsonDocument, path: &FieldPath, value: Bson) -> Result<bool, DbError> {
    set_in_doc(root, path.segments(), value, path)
}

fn set_in_doc(doc: &mut BsonDocument, segs: &[String], value: Bson, path: &FieldPath) -> Result<bool, DbError> {
    let Some((seg, rest)) = segs.split_first() else { return Ok(false) };
    if rest.is_empty() {
        let old = doc.insert(seg.clone(), value.clone());
        return Ok(old.as_ref() != Some(&value));
    }
    match doc.get_mut(seg) {
        Some(slot) => set_in_slot(slot, rest, value, path),
        None => {
            let mut fresh = BsonDocument::new();
            set_in_doc(&mut fresh, rest, value, path)?;
            doc.insert(seg.clone(), fresh);
            Ok(true)
        }
    }
}

fn set_in_slot(slot: &mut Bson, segs: &[String], value: Bson, path: &FieldPath) -> Result<bool, DbError> {
    match slot {
        Bson::Document(d) => set_in_doc(d, segs, value, path),
        Bson::Array(items) => set_in_array(items, segs, value, path),
        other => {
            let mut fresh = BsonDocument::new();
            set_in_doc(&mut fresh, segs, value, path)?;
            *other = Bson::Document(fresh);
            Ok(true)
        }
    }
}

fn set_in_array(items: &mut Vec<Bson>, segs: &[String], value: Bson, path: &FieldPath) -> Result<bool, DbError> {
    let Some((seg, rest)) = segs.split_first() else { return Ok(false) };
    let idx = seg
        .parse::<usize>()
        .ok()
        .filter(|i| *i <= items.len())
        .ok_or_else(|| {
            DbError::invalid(format!(
                "'{seg}' is not an index into the {}-element array at '{path}'",
                items.len()
            ))
        })?;
    if rest.is_empty() {
        if idx == items.len() {
            items.push(value);
            return Ok(true);
        }
        let changed = items[idx] != value;
        items[idx] = value;
        return Ok(changed);
    }
    if idx == items.len() {
        items.push(Bson::Document(BsonDocument::new()));
    }
    set_in_slot(&mut items[idx], rest, value, path)
}

/// Remove the value at `path`. Missing parents are left alone. An array
/// element is replaced by `null` so later indices keep their positions.
pub(crate) fn unset_path(root: &mut BsonDocument, path: &FieldPath) -> bool {
    unset_in_doc(root, path.segments())
}

fn unset_in_doc(doc: &mut BsonDocument, segs: &[String]) -> bool {
    match segs {
        [] => false,
        [leaf] => doc.remove(leaf).is_some(),
        [seg, rest @ ..] => doc.get_mut(seg).is_some_and(|slot| unset_in_slot(slot, rest)),
    }
}

fn unset_in_slot(slot: &mut Bson, segs: &[String]) -> bool {
    match slot {
        Bson::Document(d) => unset_in_doc(d, segs),
        Bson::Array(items) => {
            let Some((seg, rest)) = segs.split_first() else { return false };
            let Some(item) = seg.parse::<usize>().ok().and_then(|i| items.get_mut(i)) else {
                return false;
            };
            if rest.is_empty() {
                !matches!(std::mem::replace(item, Bson::Null), Bson::Null)
            } else {
                unset_in_slot(item, rest)
            }
        }
        _ => false,
    }
}

/// Detach and return the value at `path`, descending documents only.
pub(crate) fn take_path(root: &mut BsonDocument, path: &FieldPath) -> Option<Bson> {
    let (parents, leaf) = path.split_leaf();
    let mut cur = root;
    for seg in parents {
        match cur.get_mut(seg) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    cur.remove(leaf)
}
