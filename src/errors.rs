use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Record store unavailable")]
    StoreUnavailable,

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Duplicate record ID: {0}")]
    DuplicateId(String),

    #[error("Type mismatch at '{path}': expected {expected}")]
    TypeMismatch { path: String, expected: &'static str },
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<toml::de::Error> for DbError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl DbError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidExpression(msg.into())
    }
}
