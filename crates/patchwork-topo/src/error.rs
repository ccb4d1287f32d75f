//! Error types for topology construction.

use thiserror::Error;

/// Errors that can occur while stitching patch topology.
#[derive(Error, Debug)]
pub enum TopologyError {
    /// A candidate entity coincides with more than one canonical entity.
    ///
    /// This means the matching tolerance is too loose for the model's
    /// feature scale: distinct entities can no longer be told apart, and any
    /// choice between them would silently corrupt the numbering.
    #[error(
        "ambiguous {kind} match: candidate coincides with {count} canonical \
         {kind}s within tolerance {tol}"
    )]
    AmbiguousMatch {
        /// Entity kind ("vertex", "line", or "face").
        kind: &'static str,
        /// Number of canonical entities the candidate matched.
        count: usize,
        /// The tolerance in effect.
        tol: f64,
    },
}
