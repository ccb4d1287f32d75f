//! Error types for model orchestration.

use patchwork_spline::SplineError;
use patchwork_topo::TopologyError;
use thiserror::Error;

/// Errors that can occur while orchestrating a multipatch model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// I/O error reading or writing a model file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the spline kernel.
    #[error(transparent)]
    Spline(#[from] SplineError),

    /// Error from topology construction.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// A patch stream mixed surface and volume patches.
    #[error("Patch stream mixes surface and volume patches")]
    MixedPatchKinds,

    /// A patch stream contained no patches.
    #[error("Patch stream contains no patches")]
    EmptyModel,

    /// An operation needed the topology, but it has not been built (or was
    /// invalidated by a mutation).
    #[error("Topology has not been built")]
    TopologyNotBuilt,

    /// A patch id is out of range.
    #[error("Patch {0} does not exist")]
    InvalidPatch(usize),

    /// A local entity index is out of range for its kind.
    #[error("Local {kind} index {index} out of range")]
    InvalidLocalIndex {
        /// Entity kind ("face", "line", or "vertex").
        kind: &'static str,
        /// The offending index.
        index: usize,
    },
}
