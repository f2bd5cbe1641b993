//! Record storage: the contract the engines consume, and an in-memory implementation.
mod core;
mod memory;

pub use self::core::{RecordStore, ScopeFn, WriteScope};
pub use self::memory::MemoryStore;
