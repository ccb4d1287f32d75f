#![warn(missing_docs)]

//! Topological entities and patch stitching for the patchwork preprocessor.
//!
//! A multipatch spline model is an unstructured collection of patches whose
//! boundaries happen to coincide geometrically. This crate discovers those
//! coincidences: every patch's corners, edges, and faces are compared within
//! a global tolerance and interned into canonical, deduplicated arenas, so
//! that downstream numbering can treat a shared boundary as one entity no
//! matter how each patch parametrizes it.
//!
//! # Key types
//!
//! - [`TopologySet`] — canonical entity arenas plus per-patch primitive sets
//! - [`Vertex`], [`Line`], [`Face`] — the canonical entities
//! - [`FaceOrientation`] — how a patch-local grid maps onto its canonical face
//!
//! Comparison is orientation insensitive: a line matches its reversed copy,
//! a face matches any of the eight symmetries of its grid. A candidate that
//! matches more than one canonical entity is rejected as ambiguous rather
//! than silently resolved.

mod error;
mod primitives;
mod set;

pub use error::TopologyError;
pub use primitives::{
    line_enumeration, surface_edge_corners, volume_edge_corners, volume_edge_dir,
    volume_face_corners, volume_face_edges, EdgeRef, Face, FaceCollapse, FaceId, FaceOrientation,
    FaceRef, Line, LineId, SurfacePrimitives, Vertex, VertexId, VolumePrimitives,
};
pub use set::TopologySet;
