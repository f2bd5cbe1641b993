use bson::Bson;
use serde::{Deserialize, Serialize};

use super::path::FieldPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

/// Sort and page directives for `evaluate`. Paging is applied after sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    pub sort: Option<Vec<SortSpec>>,
    pub skip: Option<usize>,
    pub take: Option<usize>,
}

impl FindOptions {
    /// Append a sort key; earlier keys take precedence.
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, order: Order) -> Self {
        self.sort.get_or_insert_with(Vec::new).push(SortSpec { field: field.into(), order });
        self
    }

    #[must_use]
    pub const fn skip(mut self, n: usize) -> Self {
        self.skip = Some(n);
        self
    }

    #[must_use]
    pub const fn take(mut self, n: usize) -> Self {
        self.take = Some(n);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    #[must_use]
    pub const fn accepts(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Gt => matches!(ord, Greater),
            Self::Gte => matches!(ord, Greater | Equal),
            Self::Lt => matches!(ord, Less),
            Self::Lte => matches!(ord, Less | Equal),
        }
    }
}

/// One constraint on a resolved value.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Bson),
    Cmp { op: CmpOp, value: Bson },
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    Exists(bool),
}

/// All predicates attached to one field path; every one must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub path: FieldPath,
    pub predicates: Vec<Predicate>,
}

/// A parsed filter expression. Clauses are AND-combined; no clauses matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub clauses: Vec<Clause>,
}

impl Filter {
    #[must_use]
    pub fn matches_all(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SortKey {
    pub path: FieldPath,
    pub order: Order,
}

/// A parsed update expression.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateDoc {
    pub set: Vec<(FieldPath, Bson)>,
    pub inc: Vec<(FieldPath, Bson)>,
    pub mul: Vec<(FieldPath, Bson)>,
    /// `(from, to)` pairs.
    pub rename: Vec<(FieldPath, FieldPath)>,
    pub unset: Vec<FieldPath>,
}

impl UpdateDoc {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.inc.is_empty()
            && self.mul.is_empty()
            && self.rename.is_empty()
            && self.unset.is_empty()
    }
}
