#![warn(missing_docs)]

//! Math types for the patchwork isogeometric preprocessor.
//!
//! Thin wrappers around nalgebra providing domain-specific types for
//! multipatch spline models: control points, parametric derivatives,
//! and the coincidence tolerance used when stitching patch topology.

use nalgebra::Vector3;

/// A control point (or any point) in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A 3x3 matrix, used for the parametric Jacobian.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Coincidence tolerance for geometric comparisons.
///
/// Two control points closer than `linear` (euclidean distance) are treated
/// as the same physical point when building the model topology. The value is
/// a single global parameter; choosing it appropriately for the model's
/// feature scale is the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
}

impl Tolerance {
    /// Default topology tolerance (1e-4), suitable for unit-scale models.
    pub const DEFAULT: Self = Self { linear: 1e-4 };

    /// Create a tolerance from a linear distance.
    pub fn new(linear: f64) -> Self {
        Self { linear }
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
