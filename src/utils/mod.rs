//! Utility modules: developer logging, JSON conversion, logger setup.
pub mod devlog;
pub mod json;
pub mod logger;
