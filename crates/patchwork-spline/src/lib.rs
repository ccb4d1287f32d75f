#![warn(missing_docs)]

//! Tensor-product B-spline geometry kernel for the patchwork preprocessor.
//!
//! Provides non-rational B-spline surfaces and volumes evaluated via
//! De Boor's algorithm, together with the mutation primitives the topology
//! and numbering layers need: knot insertion, uniform h-refinement,
//! boundary-layer refinement, degree elevation, and parametric direction
//! reversal. The kernel also owns the native text serialization of patch
//! streams.
//!
//! # Key types
//!
//! - [`SplineSurface`] — bivariate tensor-product B-spline patch
//! - [`SplineVolume`] — trivariate tensor-product B-spline patch
//! - [`Patch`] — either of the above, as read from a patch stream
//!
//! # Algorithms
//!
//! - **De Boor's algorithm** for stable evaluation
//! - **Boehm's algorithm** for knot insertion
//! - **Greville collocation** for degree elevation (the patch lies in the
//!   elevated spline space, so interpolating it at the Greville abscissae of
//!   the elevated knot vector reproduces it exactly)

use nalgebra::DMatrix;
use patchwork_math::Point3;

mod error;
pub mod io;
mod surface;
mod volume;

pub use error::SplineError;
pub use io::Patch;
pub use surface::SplineSurface;
pub use volume::{FaceGrid, SplineVolume};

/// A parametric direction of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDir {
    /// First parametric direction.
    U,
    /// Second parametric direction.
    V,
    /// Third parametric direction (volumes only).
    W,
}

impl ParamDir {
    /// Zero-based index of the direction.
    pub fn index(self) -> usize {
        match self {
            ParamDir::U => 0,
            ParamDir::V => 1,
            ParamDir::W => 2,
        }
    }

    /// Direction from a zero-based index, if valid.
    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(ParamDir::U),
            1 => Some(ParamDir::V),
            2 => Some(ParamDir::W),
            _ => None,
        }
    }
}

// =============================================================================
// Knot vector utilities
// =============================================================================

/// Validate a knot vector: non-decreasing, length = n_control_points + degree + 1.
pub(crate) fn validate_knots(knots: &[f64], n_points: usize, degree: usize) -> bool {
    if knots.len() != n_points + degree + 1 {
        return false;
    }
    for i in 1..knots.len() {
        if knots[i] < knots[i - 1] {
            return false;
        }
    }
    true
}

/// Find the knot span index for parameter `t`.
///
/// Returns `i` such that `knots[i] <= t < knots[i+1]`, clamped to the valid
/// range. For `t` at the end of the domain, returns the last valid span.
pub(crate) fn find_span(knots: &[f64], n: usize, degree: usize, t: f64) -> usize {
    // n = number of control points - 1 (last index)
    if t >= knots[n + 1] {
        return n; // last valid span
    }
    if t <= knots[degree] {
        return degree; // first valid span
    }
    // Binary search
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Compute non-zero basis function values at parameter `t`.
///
/// Returns a vector of `degree + 1` values `N[span-degree..=span]` at `t`.
pub(crate) fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() < 1e-30 {
                // Zero-length knot interval — avoid division by zero
                n[j] = saved;
                continue;
            }
            let temp = n[r] / denom;
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }

    n
}

/// Parameter domain of a knot vector: `(knots[degree], knots[n_points])`.
pub(crate) fn knot_domain(knots: &[f64], degree: usize, n_points: usize) -> (f64, f64) {
    (knots[degree], knots[n_points])
}

/// The nonempty knot spans inside the parameter domain.
pub(crate) fn nonempty_spans(knots: &[f64], degree: usize, n_points: usize) -> Vec<(f64, f64)> {
    let mut spans = Vec::new();
    for i in degree..n_points {
        if knots[i + 1] > knots[i] {
            spans.push((knots[i], knots[i + 1]));
        }
    }
    spans
}

// =============================================================================
// Row operations
//
// A "row" is the 1D sequence of control points obtained by freezing all but
// one parametric direction of a tensor grid. Every per-direction operation
// (evaluation, insertion, elevation) factors through these.
// =============================================================================

/// Evaluate a 1D B-spline row at parameter `t` using De Boor's algorithm.
pub(crate) fn eval_row(pts: &[Point3], knots: &[f64], degree: usize, t: f64) -> Point3 {
    let n = pts.len() - 1;
    let t = t.clamp(knots[degree], knots[n + 1]);
    let span = find_span(knots, n, degree, t);
    let basis = basis_functions(knots, span, degree, t);

    let mut point = Point3::origin();
    for (i, &b) in basis.iter().enumerate() {
        let cp = &pts[span - degree + i];
        point.x += b * cp.x;
        point.y += b * cp.y;
        point.z += b * cp.z;
    }
    point
}

/// Knot vector after inserting `t` into the span found at `span`.
pub(crate) fn inserted_knots(knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut new_knots = Vec::with_capacity(knots.len() + 1);
    new_knots.extend_from_slice(&knots[..=span]);
    new_knots.push(t);
    new_knots.extend_from_slice(&knots[span + 1..]);
    new_knots
}

/// Control points after inserting knot `t` using Boehm's algorithm.
///
/// `span` must be the span of `t` in the old knot vector.
pub(crate) fn insert_knot_row(
    pts: &[Point3],
    knots: &[f64],
    degree: usize,
    span: usize,
    t: f64,
) -> Vec<Point3> {
    let n = pts.len() - 1;
    let p = degree;
    let mut new_pts = Vec::with_capacity(pts.len() + 1);

    // Points before the affected range
    for pt in pts.iter().take(span.saturating_sub(p) + 1) {
        new_pts.push(*pt);
    }

    // Affected points
    for i in (span - p + 1)..=span {
        let alpha = (t - knots[i]) / (knots[i + p] - knots[i]);
        let pt = Point3::new(
            (1.0 - alpha) * pts[i - 1].x + alpha * pts[i].x,
            (1.0 - alpha) * pts[i - 1].y + alpha * pts[i].y,
            (1.0 - alpha) * pts[i - 1].z + alpha * pts[i].z,
        );
        new_pts.push(pt);
    }

    // Points after the affected range
    for pt in pts.iter().take(n + 1).skip(span) {
        new_pts.push(*pt);
    }

    new_pts
}

/// Knot vector reflected about the midpoint of its domain.
///
/// The parameter domain is preserved; traversal order is reversed.
pub(crate) fn reflected_knots(knots: &[f64]) -> Vec<f64> {
    let lo = knots[0];
    let hi = knots[knots.len() - 1];
    knots.iter().rev().map(|k| lo + hi - k).collect()
}

/// Knot vector with every distinct value's multiplicity raised by one.
pub(crate) fn elevated_knots(knots: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(knots.len() + 2);
    let mut i = 0;
    while i < knots.len() {
        let v = knots[i];
        let mut run = 0;
        while i < knots.len() && knots[i] == v {
            run += 1;
            i += 1;
        }
        for _ in 0..=run {
            out.push(v);
        }
    }
    out
}

/// Greville abscissae of a knot vector: averages of `degree` consecutive knots.
pub(crate) fn greville_abscissae(knots: &[f64], degree: usize, n_points: usize) -> Vec<f64> {
    (0..n_points)
        .map(|i| knots[i + 1..=i + degree].iter().sum::<f64>() / degree as f64)
        .collect()
}

/// Degree elevation by one order along a single direction.
///
/// Built once per direction: the elevated knot vector, its Greville
/// abscissae, and the LU-factored collocation matrix are shared by every
/// row of the tensor grid.
pub(crate) struct DegreeElevator {
    /// Elevated knot vector.
    pub(crate) knots: Vec<f64>,
    /// Elevated degree.
    pub(crate) degree: usize,
    tau: Vec<f64>,
    lu: nalgebra::LU<f64, nalgebra::Dyn, nalgebra::Dyn>,
}

impl DegreeElevator {
    pub(crate) fn new(knots: &[f64], degree: usize) -> Self {
        let eknots = elevated_knots(knots);
        let edeg = degree + 1;
        let m = eknots.len() - edeg - 1;
        let tau = greville_abscissae(&eknots, edeg, m);

        let mut a = DMatrix::zeros(m, m);
        for (r, &t) in tau.iter().enumerate() {
            let span = find_span(&eknots, m - 1, edeg, t);
            let basis = basis_functions(&eknots, span, edeg, t);
            for (c, &b) in basis.iter().enumerate() {
                a[(r, span - edeg + c)] = b;
            }
        }

        Self {
            knots: eknots,
            degree: edeg,
            tau,
            lu: a.lu(),
        }
    }

    /// Number of control points per row after elevation.
    pub(crate) fn point_count(&self) -> usize {
        self.tau.len()
    }

    /// Elevate one row: interpolate the row's curve at the Greville
    /// abscissae of the elevated space.
    pub(crate) fn elevate_row(
        &self,
        pts: &[Point3],
        knots: &[f64],
        degree: usize,
    ) -> Result<Vec<Point3>, SplineError> {
        let m = self.tau.len();
        let mut b = DMatrix::zeros(m, 3);
        for (r, &t) in self.tau.iter().enumerate() {
            let p = eval_row(pts, knots, degree, t);
            b[(r, 0)] = p.x;
            b[(r, 1)] = p.y;
            b[(r, 2)] = p.z;
        }
        let x = self.lu.solve(&b).ok_or(SplineError::SingularElevation)?;
        Ok((0..m)
            .map(|i| Point3::new(x[(i, 0)], x[(i, 1)], x[(i, 2)]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_span() {
        let knots = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        // 4 control points, degree 2, n=3
        assert_eq!(find_span(&knots, 3, 2, 0.0), 2);
        assert_eq!(find_span(&knots, 3, 2, 0.25), 2);
        assert_eq!(find_span(&knots, 3, 2, 0.5), 3);
        assert_eq!(find_span(&knots, 3, 2, 1.0), 3); // end of domain
    }

    #[test]
    fn test_basis_partition_of_unity() {
        let knots = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0];
        let degree = 2;
        let n = 5; // 6 control points, n = last index

        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let t = t.clamp(knots[degree], knots[n + 1]);
            let span = find_span(&knots, n, degree, t);
            let basis = basis_functions(&knots, span, degree, t);
            let sum: f64 = basis.iter().sum();
            assert!(
                (sum - 1.0).abs() < 1e-10,
                "partition of unity failed at t={}: sum={}",
                t,
                sum
            );
        }
    }

    #[test]
    fn test_eval_row_linear() {
        // Degree 1 row = polyline
        let pts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let mid = eval_row(&pts, &knots, 1, 0.5);
        assert!((mid.x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_insert_knot_row_preserves_curve() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        let knots = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let t = 0.25;
        let span = find_span(&knots, pts.len() - 1, 2, t);
        let new_pts = insert_knot_row(&pts, &knots, 2, span, t);
        let new_knots = inserted_knots(&knots, span, t);
        assert_eq!(new_pts.len(), 5);

        for i in 0..=10 {
            let u = i as f64 / 10.0;
            let a = eval_row(&pts, &knots, 2, u);
            let b = eval_row(&new_pts, &new_knots, 2, u);
            assert!(
                (a - b).norm() < 1e-10,
                "mismatch at t={}: {:?} vs {:?}",
                u,
                a,
                b
            );
        }
    }

    #[test]
    fn test_reflected_knots() {
        let knots = vec![0.0, 0.0, 0.3, 1.0, 1.0];
        let r = reflected_knots(&knots);
        for (a, b) in r.iter().zip(&[0.0, 0.0, 0.7, 1.0, 1.0]) {
            assert!((a - b).abs() < 1e-12, "reflected knots {:?}", r);
        }
    }

    #[test]
    fn test_elevated_knots_multiplicity() {
        let knots = vec![0.0, 0.0, 0.5, 1.0, 1.0];
        let e = elevated_knots(&knots);
        assert_eq!(e, vec![0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_greville_clamped_ends() {
        // Clamped quadratic: first and last Greville abscissae hit the domain ends
        let knots = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let tau = greville_abscissae(&knots, 2, 4);
        assert!((tau[0] - 0.0).abs() < 1e-12);
        assert!((tau[3] - 1.0).abs() < 1e-12);
        assert_eq!(tau.len(), 4);
    }

    #[test]
    fn test_elevate_row_linear_to_quadratic() {
        // A single-span degree-1 line elevates to the known quadratic form
        // [P0, (P0+P1)/2, P1].
        let pts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 2.0, 0.0)];
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let elev = DegreeElevator::new(&knots, 1);
        assert_eq!(elev.point_count(), 3);
        let new_pts = elev.elevate_row(&pts, &knots, 1).unwrap();
        assert!((new_pts[0] - pts[0]).norm() < 1e-10);
        assert!((new_pts[1] - Point3::new(2.0, 1.0, 0.0)).norm() < 1e-10);
        assert!((new_pts[2] - pts[1]).norm() < 1e-10);
    }

    #[test]
    fn test_elevate_row_preserves_curve() {
        // Multi-span quadratic: elevated row must evaluate to the same curve
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 1.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        let knots = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let elev = DegreeElevator::new(&knots, 2);
        let new_pts = elev.elevate_row(&pts, &knots, 2).unwrap();
        // One extra point per nonempty span
        assert_eq!(new_pts.len(), 6);

        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let a = eval_row(&pts, &knots, 2, t);
            let b = eval_row(&new_pts, &elev.knots, elev.degree, t);
            assert!(
                (a - b).norm() < 1e-8,
                "elevation changed the curve at t={}: {:?} vs {:?}",
                t,
                a,
                b
            );
        }
    }

    #[test]
    fn test_nonempty_spans() {
        let knots = vec![0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0];
        // degree 2, 5 control points
        let spans = nonempty_spans(&knots, 2, 5);
        assert_eq!(spans, vec![(0.0, 0.5), (0.5, 1.0)]);
    }
}
