//! Rejection-sampling loop: oversample from a data source, filter through a
//! constraint pipeline, accumulate distinct rows until a target is met.

pub mod engine;
pub mod errors;
pub mod model;
pub mod source;

pub use engine::{Resampler, resample_until_satisfy};
pub use errors::{ResampleError, Result};
pub use model::{ResampleOptions, ResampleOutcome, ResampleReport, ResampleStatus};
pub use source::{DataSource, InverseTransform, SourceError};
