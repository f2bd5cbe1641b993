//! Engine configuration: safety limits applied while parsing expressions.
//!
//! Precedence when loading: environment variables > TOML file > defaults.
//! - `ODMLITE_CONFIG`: path of a TOML file to read first
//! - `ODMLITE_MAX_PATH_DEPTH`, `ODMLITE_MAX_IN_SET`, `ODMLITE_MAX_SORT_FIELDS`, `ODMLITE_MAX_TAKE`

use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_PATH_DEPTH: usize = 32;
pub const DEFAULT_MAX_IN_SET: usize = 1000;
pub const DEFAULT_MAX_SORT_FIELDS: usize = 8;
pub const DEFAULT_MAX_TAKE: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of segments in a dot-separated field path.
    pub max_path_depth: usize,
    /// Maximum operand length for `$in` / `$nin`.
    pub max_in_set: usize,
    /// Maximum number of sort keys in one directive.
    pub max_sort_fields: usize,
    /// Largest accepted `take`.
    pub max_take: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
            max_in_set: DEFAULT_MAX_IN_SET,
            max_sort_fields: DEFAULT_MAX_SORT_FIELDS,
            max_take: DEFAULT_MAX_TAKE,
        }
    }
}

impl EngineConfig {
    /// # Errors
    /// Returns `Config` if the text is not valid TOML or a limit is zero.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns `Io` if the file cannot be read, `Config` if it does not parse.
    pub fn load(path: &Path) -> Result<Self, DbError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Build a config from `ODMLITE_CONFIG` (if set) and the per-limit overrides.
    ///
    /// # Errors
    /// Returns `Config` if an override is not a positive integer.
    pub fn from_env() -> Result<Self, DbError> {
        let mut cfg = match std::env::var("ODMLITE_CONFIG") {
            Ok(p) => Self::load(Path::new(&p))?,
            Err(_) => Self::default(),
        };
        if let Some(v) = env_usize("ODMLITE_MAX_PATH_DEPTH")? {
            cfg.max_path_depth = v;
        }
        if let Some(v) = env_usize("ODMLITE_MAX_IN_SET")? {
            cfg.max_in_set = v;
        }
        if let Some(v) = env_usize("ODMLITE_MAX_SORT_FIELDS")? {
            cfg.max_sort_fields = v;
        }
        if let Some(v) = env_usize("ODMLITE_MAX_TAKE")? {
            cfg.max_take = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns `Config` naming the first limit that is zero.
    pub fn validate(&self) -> Result<(), DbError> {
        let limits = [
            ("max_path_depth", self.max_path_depth),
            ("max_in_set", self.max_in_set),
            ("max_sort_fields", self.max_sort_fields),
            ("max_take", self.max_take),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(DbError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Result<Option<usize>, DbError> {
    match std::env::var(key) {
        Ok(s) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| DbError::Config(format!("{key}: {e}"))),
        Err(_) => Ok(None),
    }
}
