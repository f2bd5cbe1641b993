//! Filter/update expression language and the engines that run it against a
//! [`RecordStore`](crate::store::RecordStore).

mod cursor;
mod eval;
mod exec;
mod mutate;
mod parse;
mod path;
mod types;

pub use cursor::Cursor;
pub use eval::{compare_bson, compare_values, eval_filter, values_equal};
pub use exec::QueryEngine;
pub use mutate::{MutationEngine, apply_update};
pub use parse::{parse_filter, parse_filter_json, parse_sort_json, parse_update, parse_update_json};
pub use path::{FieldPath, Lookup, resolve};
pub use types::{Clause, CmpOp, Filter, FindOptions, Order, Predicate, SortSpec, UpdateDoc};
