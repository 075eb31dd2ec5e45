//! Crate-wide error type.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or outside its physical range.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An unknown model key was passed to a model factory.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),
    /// A catalogue entry could not be found.
    #[error("resource missing: {0}")]
    ResourceMissing(String),
    /// Derived data was requested before it was computed.
    #[error("not processed: {0}")]
    NotProcessed(String),
    /// A numerical procedure produced an unusable result.
    #[error("calculation error: {0}")]
    Calculation(String),
    /// A NaN or infinity showed up in an intermediate result.
    #[error("NaN result: {0}")]
    NaNResult(String),
    /// An iterative procedure ran out of its loop budget.
    #[error("diverged: {0}")]
    Diverged(String),
    /// A gap description violates a structural invariant.
    #[error("gap error: {0}")]
    Gap(String),
    /// The coil has no turns description yet.
    #[error("coil not wound: {0}")]
    CoilNotWound(String),
    /// The core has no processed description yet.
    #[error("core not processed: {0}")]
    CoreNotProcessed(String),
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Shorthand for a `Result` with this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns an [`Error::NaNResult`] if `value` is not finite, `value` otherwise.
    pub fn check_finite(value: f64, context: &str) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::NaNResult(context.to_owned()))
        }
    }
}
