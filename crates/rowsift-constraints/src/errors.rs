use rowsift_core::CoreError;
use rowsift_expr::ParseError;
use thiserror::Error;

/// Configuration and apply-time validation errors.
///
/// Raised eagerly: grammar and shape problems at construction, missing
/// fields at the start of `apply`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{kind}[{index}] '{expression}': {source}")]
    InvalidExpression {
        kind: String,
        index: usize,
        expression: String,
        source: ParseError,
    },
    #[error("invalid {kind} configuration: {message}")]
    Invalid { kind: String, message: String },
    #[error("field '{field}' referenced by {kind} not found in table")]
    FieldNotFound { kind: String, field: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("table error: {0}")]
    Core(#[from] CoreError),
}

impl ConfigError {
    pub fn invalid(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// True when a referenced field is absent from the table being filtered.
    pub fn is_field_not_found(&self) -> bool {
        matches!(self, ConfigError::FieldNotFound { .. })
    }
}

/// Result type for constraint operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
