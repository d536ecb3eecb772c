use std::collections::TryReserveError;

use thiserror::Error;

/// Result type for graphseg operations
pub type Result<T> = std::result::Result<T, GraphSegError>;

/// Errors that can occur while segmenting an image
#[derive(Error, Debug)]
pub enum GraphSegError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GraphSegError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build an allocation error for a working buffer of `what`
    pub(crate) fn allocation(what: &str, err: TryReserveError) -> Self {
        Self::AllocationFailure(format!("{what}: {err}"))
    }

    /// Allocate `len` copies of `value`, reporting exhaustion instead of aborting.
    pub(crate) fn try_vec<T: Clone>(len: usize, value: T, what: &str) -> Result<Vec<T>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|e| Self::allocation(what, e))?;
        buf.resize(len, value);
        Ok(buf)
    }

    /// Returns true if the caller supplied bad data or parameters.
    ///
    /// Such errors recur identically on retry; the computation is pure.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::ImageError(_))
    }
}
