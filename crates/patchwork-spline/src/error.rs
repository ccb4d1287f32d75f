//! Error types for spline construction, refinement, and patch stream I/O.

use thiserror::Error;

/// Errors that can occur in the spline kernel.
#[derive(Error, Debug)]
pub enum SplineError {
    /// I/O error reading or writing a patch stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed patch stream: unexpected or missing token.
    #[error("Parse error: {message}")]
    Parse {
        /// Error message.
        message: String,
    },

    /// Patch stream declares an entity class this kernel does not handle.
    #[error("Unsupported patch class: {0}")]
    UnsupportedClass(i64),

    /// Patch stream declares a dimension or rational flag this kernel does not handle.
    #[error("Unsupported patch format: {0}")]
    UnsupportedFormat(String),

    /// Knot vector is not non-decreasing or has the wrong length.
    #[error("Invalid knot vector: {0}")]
    InvalidKnots(String),

    /// Parametric direction does not exist on this patch.
    #[error("Invalid parametric direction {dir} for a patch with {rank} directions")]
    InvalidDirection {
        /// The offending direction index.
        dir: usize,
        /// Number of parametric directions on the patch.
        rank: usize,
    },

    /// A refinement parameter is outside its valid range.
    #[error("Invalid refinement parameter: {0}")]
    InvalidParameter(String),

    /// The degree-elevation collocation system could not be solved.
    #[error("Degree elevation failed: singular collocation system")]
    SingularElevation,
}

impl SplineError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
