use rowsift_constraints::ConfigError;
use rowsift_core::CoreError;
use thiserror::Error;

use crate::source::SourceError;

/// Errors raised by the resample loop.
///
/// Running out of trials is not an error; it is reported through
/// `ResampleStatus::Aborted`.
#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("data source failed: {0}")]
    Source(#[source] SourceError),
    #[error("constraint error: {0}")]
    Constraint(#[from] ConfigError),
    #[error("table error: {0}")]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, ResampleError>;
