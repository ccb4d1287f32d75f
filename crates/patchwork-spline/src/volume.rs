//! Trivariate tensor-product B-spline volumes.
//!
//! Control points are stored u-fastest: `points[(k * n_v + j) * n_u + i]`.
//! Corner, edge, and face queries follow the hexahedron conventions used by
//! the topology layer: corner `c` has local ends `(c & 1, c >> 1 & 1, c >> 2 & 1)`,
//! edges 0–3 run along u, 4–7 along v, 8–11 along w, and faces come in
//! min/max pairs per direction (0/1 = u, 2/3 = v, 4/5 = w).

use patchwork_math::{Matrix3, Point3, Vec3};

use crate::{
    basis_functions, find_span, insert_knot_row, inserted_knots, knot_domain, nonempty_spans,
    reflected_knots, validate_knots, DegreeElevator, ParamDir, SplineError,
};

/// A rectangular grid of control points extracted from a patch boundary.
///
/// `points` is stored first-index fastest: `points[i2 * n1 + i1]`.
#[derive(Debug, Clone)]
pub struct FaceGrid {
    /// Grid points, first index fastest.
    pub points: Vec<Point3>,
    /// Point count along the first grid direction.
    pub n1: usize,
    /// Point count along the second grid direction.
    pub n2: usize,
}

impl FaceGrid {
    /// Grid point at `(i1, i2)`.
    pub fn at(&self, i1: usize, i2: usize) -> &Point3 {
        &self.points[i2 * self.n1 + i1]
    }
}

/// A non-rational trivariate tensor-product B-spline volume.
#[derive(Debug, Clone)]
pub struct SplineVolume {
    /// Control points, u fastest, then v, then w.
    pub control_points: Vec<Point3>,
    /// Number of control points in u.
    pub n_u: usize,
    /// Number of control points in v.
    pub n_v: usize,
    /// Number of control points in w.
    pub n_w: usize,
    /// Knot vector in u. Length = n_u + degree_u + 1.
    pub knots_u: Vec<f64>,
    /// Knot vector in v.
    pub knots_v: Vec<f64>,
    /// Knot vector in w.
    pub knots_w: Vec<f64>,
    /// Polynomial degree in u.
    pub degree_u: usize,
    /// Polynomial degree in v.
    pub degree_v: usize,
    /// Polynomial degree in w.
    pub degree_w: usize,
}

impl SplineVolume {
    /// Create a B-spline volume.
    ///
    /// # Panics
    /// Panics if the control grid or a knot vector has the wrong size.
    pub fn new(
        control_points: Vec<Point3>,
        n: [usize; 3],
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        knots_w: Vec<f64>,
        degrees: [usize; 3],
    ) -> Self {
        let [n_u, n_v, n_w] = n;
        let [degree_u, degree_v, degree_w] = degrees;
        assert_eq!(
            control_points.len(),
            n_u * n_v * n_w,
            "control point count mismatch: {} != {} * {} * {}",
            control_points.len(),
            n_u,
            n_v,
            n_w
        );
        assert!(
            validate_knots(&knots_u, n_u, degree_u),
            "invalid u knot vector"
        );
        assert!(
            validate_knots(&knots_v, n_v, degree_v),
            "invalid v knot vector"
        );
        assert!(
            validate_knots(&knots_w, n_w, degree_w),
            "invalid w knot vector"
        );
        Self {
            control_points,
            n_u,
            n_v,
            n_w,
            knots_u,
            knots_v,
            knots_w,
            degree_u,
            degree_v,
            degree_w,
        }
    }

    fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.n_v + j) * self.n_u + i
    }

    /// Control point at grid position `(i, j, k)`.
    pub fn cp(&self, i: usize, j: usize, k: usize) -> &Point3 {
        &self.control_points[self.idx(i, j, k)]
    }

    /// Number of control points along `dir`.
    pub fn num_points(&self, dir: ParamDir) -> usize {
        match dir {
            ParamDir::U => self.n_u,
            ParamDir::V => self.n_v,
            ParamDir::W => self.n_w,
        }
    }

    /// Polynomial degree along `dir`.
    pub fn degree(&self, dir: ParamDir) -> usize {
        match dir {
            ParamDir::U => self.degree_u,
            ParamDir::V => self.degree_v,
            ParamDir::W => self.degree_w,
        }
    }

    fn knots(&self, dir: ParamDir) -> &[f64] {
        match dir {
            ParamDir::U => &self.knots_u,
            ParamDir::V => &self.knots_v,
            ParamDir::W => &self.knots_w,
        }
    }

    /// Parameter domain along `dir`.
    pub fn domain(&self, dir: ParamDir) -> (f64, f64) {
        knot_domain(self.knots(dir), self.degree(dir), self.num_points(dir))
    }

    /// Number of nonempty knot spans along `dir`.
    pub fn num_spans(&self, dir: ParamDir) -> usize {
        nonempty_spans(self.knots(dir), self.degree(dir), self.num_points(dir)).len()
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate the volume at `(u, v, w)` using tensor-product De Boor.
    pub fn eval(&self, u: f64, v: f64, w: f64) -> Point3 {
        let nu = self.n_u - 1;
        let nv = self.n_v - 1;
        let nw = self.n_w - 1;
        let u = u.clamp(self.knots_u[self.degree_u], self.knots_u[nu + 1]);
        let v = v.clamp(self.knots_v[self.degree_v], self.knots_v[nv + 1]);
        let w = w.clamp(self.knots_w[self.degree_w], self.knots_w[nw + 1]);

        let span_u = find_span(&self.knots_u, nu, self.degree_u, u);
        let span_v = find_span(&self.knots_v, nv, self.degree_v, v);
        let span_w = find_span(&self.knots_w, nw, self.degree_w, w);
        let basis_u = basis_functions(&self.knots_u, span_u, self.degree_u, u);
        let basis_v = basis_functions(&self.knots_v, span_v, self.degree_v, v);
        let basis_w = basis_functions(&self.knots_w, span_w, self.degree_w, w);

        let mut point = Point3::origin();
        for (k, &bw) in basis_w.iter().enumerate() {
            let k_idx = span_w - self.degree_w + k;
            for (j, &bv) in basis_v.iter().enumerate() {
                let j_idx = span_v - self.degree_v + j;
                for (i, &bu) in basis_u.iter().enumerate() {
                    let i_idx = span_u - self.degree_u + i;
                    let weight = bu * bv * bw;
                    let cp = self.cp(i_idx, j_idx, k_idx);
                    point.x += weight * cp.x;
                    point.y += weight * cp.y;
                    point.z += weight * cp.z;
                }
            }
        }
        point
    }

    /// Partial derivative with respect to u (central finite difference).
    pub fn deriv_u(&self, u: f64, v: f64, w: f64) -> Vec3 {
        let (lo, hi) = self.domain(ParamDir::U);
        let du = (hi - lo) * 1e-7;
        let p0 = self.eval((u - du).max(lo), v, w);
        let p1 = self.eval((u + du).min(hi), v, w);
        (p1 - p0) / (2.0 * du)
    }

    /// Partial derivative with respect to v.
    pub fn deriv_v(&self, u: f64, v: f64, w: f64) -> Vec3 {
        let (lo, hi) = self.domain(ParamDir::V);
        let dv = (hi - lo) * 1e-7;
        let p0 = self.eval(u, (v - dv).max(lo), w);
        let p1 = self.eval(u, (v + dv).min(hi), w);
        (p1 - p0) / (2.0 * dv)
    }

    /// Partial derivative with respect to w.
    pub fn deriv_w(&self, u: f64, v: f64, w: f64) -> Vec3 {
        let (lo, hi) = self.domain(ParamDir::W);
        let dw = (hi - lo) * 1e-7;
        let p0 = self.eval(u, v, (w - dw).max(lo));
        let p1 = self.eval(u, v, (w + dw).min(hi));
        (p1 - p0) / (2.0 * dw)
    }

    /// Determinant of the parametric Jacobian at `(u, v, w)`.
    ///
    /// Positive for a right-handed parametrization at that point.
    pub fn jacobian_determinant(&self, u: f64, v: f64, w: f64) -> f64 {
        let j = Matrix3::from_columns(&[
            self.deriv_u(u, v, w),
            self.deriv_v(u, v, w),
            self.deriv_w(u, v, w),
        ]);
        j.determinant()
    }

    // =========================================================================
    // Boundary extraction
    // =========================================================================

    /// Control point at corner `c` (0–7, bits = u/v/w ends).
    pub fn corner(&self, c: usize) -> Point3 {
        assert!(c < 8, "corner index out of range: {}", c);
        let i = (c & 1) * (self.n_u - 1);
        let j = ((c >> 1) & 1) * (self.n_v - 1);
        let k = ((c >> 2) & 1) * (self.n_w - 1);
        *self.cp(i, j, k)
    }

    /// Ordered control points along edge `e` (0–11).
    ///
    /// Edges 0–3 run along u at `(v, w)` ends `(0,0), (1,0), (0,1), (1,1)`;
    /// edges 4–7 along v; edges 8–11 along w, with the same end ordering.
    pub fn edge_points(&self, e: usize) -> Vec<Point3> {
        assert!(e < 12, "edge index out of range: {}", e);
        let last = |n: usize| n - 1;
        match e / 4 {
            0 => {
                let j = (e & 1) * last(self.n_v);
                let k = ((e >> 1) & 1) * last(self.n_w);
                (0..self.n_u).map(|i| *self.cp(i, j, k)).collect()
            }
            1 => {
                let s = e - 4;
                let i = (s & 1) * last(self.n_u);
                let k = ((s >> 1) & 1) * last(self.n_w);
                (0..self.n_v).map(|j| *self.cp(i, j, k)).collect()
            }
            _ => {
                let s = e - 8;
                let i = (s & 1) * last(self.n_u);
                let j = ((s >> 1) & 1) * last(self.n_v);
                (0..self.n_w).map(|k| *self.cp(i, j, k)).collect()
            }
        }
    }

    /// Control point grid of face `f` (0–5: u-min, u-max, v-min, v-max, w-min, w-max).
    ///
    /// The grid axes are the two remaining parametric directions in order:
    /// faces 0/1 use `(v, w)`, faces 2/3 use `(u, w)`, faces 4/5 use `(u, v)`.
    pub fn face_grid(&self, f: usize) -> FaceGrid {
        assert!(f < 6, "face index out of range: {}", f);
        let end = f & 1;
        match f / 2 {
            0 => {
                let i = end * (self.n_u - 1);
                let points = (0..self.n_w)
                    .flat_map(|k| (0..self.n_v).map(move |j| (j, k)))
                    .map(|(j, k)| *self.cp(i, j, k))
                    .collect();
                FaceGrid {
                    points,
                    n1: self.n_v,
                    n2: self.n_w,
                }
            }
            1 => {
                let j = end * (self.n_v - 1);
                let points = (0..self.n_w)
                    .flat_map(|k| (0..self.n_u).map(move |i| (i, k)))
                    .map(|(i, k)| *self.cp(i, j, k))
                    .collect();
                FaceGrid {
                    points,
                    n1: self.n_u,
                    n2: self.n_w,
                }
            }
            _ => {
                let k = end * (self.n_w - 1);
                let points = (0..self.n_v)
                    .flat_map(|j| (0..self.n_u).map(move |i| (i, j)))
                    .map(|(i, j)| *self.cp(i, j, k))
                    .collect();
                FaceGrid {
                    points,
                    n1: self.n_u,
                    n2: self.n_v,
                }
            }
        }
    }

    // =========================================================================
    // Mutation primitives
    // =========================================================================

    /// Apply a row operation along `dir`, replacing the direction's knot
    /// vector and degree. The operation must map every row to `new_n` points
    /// where `new_n = new_knots.len() - new_degree - 1`.
    fn apply_direction<F>(
        &mut self,
        dir: ParamDir,
        new_knots: Vec<f64>,
        new_degree: usize,
        op: F,
    ) -> Result<(), SplineError>
    where
        F: Fn(&[Point3]) -> Result<Vec<Point3>, SplineError>,
    {
        let (nu, nv, nw) = (self.n_u, self.n_v, self.n_w);
        let new_n = new_knots.len() - new_degree - 1;
        let mut scratch = Vec::new();

        match dir {
            ParamDir::U => {
                let mut out = vec![Point3::origin(); new_n * nv * nw];
                for k in 0..nw {
                    for j in 0..nv {
                        scratch.clear();
                        scratch.extend((0..nu).map(|i| *self.cp(i, j, k)));
                        for (m, p) in op(&scratch)?.into_iter().enumerate() {
                            out[(k * nv + j) * new_n + m] = p;
                        }
                    }
                }
                self.control_points = out;
                self.n_u = new_n;
                self.knots_u = new_knots;
                self.degree_u = new_degree;
            }
            ParamDir::V => {
                let mut out = vec![Point3::origin(); nu * new_n * nw];
                for k in 0..nw {
                    for i in 0..nu {
                        scratch.clear();
                        scratch.extend((0..nv).map(|j| *self.cp(i, j, k)));
                        for (m, p) in op(&scratch)?.into_iter().enumerate() {
                            out[(k * new_n + m) * nu + i] = p;
                        }
                    }
                }
                self.control_points = out;
                self.n_v = new_n;
                self.knots_v = new_knots;
                self.degree_v = new_degree;
            }
            ParamDir::W => {
                let mut out = vec![Point3::origin(); nu * nv * new_n];
                for j in 0..nv {
                    for i in 0..nu {
                        scratch.clear();
                        scratch.extend((0..nw).map(|k| *self.cp(i, j, k)));
                        for (m, p) in op(&scratch)?.into_iter().enumerate() {
                            out[(m * nv + j) * nu + i] = p;
                        }
                    }
                }
                self.control_points = out;
                self.n_w = new_n;
                self.knots_w = new_knots;
                self.degree_w = new_degree;
            }
        }
        Ok(())
    }

    /// Reverse the parametric direction `dir`: control-point order flips and
    /// the knot vector is reflected about its domain midpoint. The geometry
    /// is unchanged; `eval` at the reflected parameter gives the same point.
    pub fn reverse_direction(&mut self, dir: ParamDir) {
        let new_knots = reflected_knots(self.knots(dir));
        let degree = self.degree(dir);
        self.apply_direction(dir, new_knots, degree, |row| {
            Ok(row.iter().rev().copied().collect())
        })
        .expect("direction reversal cannot fail");
    }

    /// Insert a knot at `t` along `dir` using Boehm's algorithm.
    ///
    /// `t` must lie strictly inside the parameter domain.
    pub fn insert_knot(&mut self, dir: ParamDir, t: f64) -> Result<(), SplineError> {
        let (lo, hi) = self.domain(dir);
        if !(t > lo && t < hi) {
            return Err(SplineError::InvalidParameter(format!(
                "knot {} outside open domain ({}, {})",
                t, lo, hi
            )));
        }
        let knots = self.knots(dir).to_vec();
        let degree = self.degree(dir);
        let span = find_span(&knots, self.num_points(dir) - 1, degree, t);
        let new_knots = inserted_knots(&knots, span, t);
        self.apply_direction(dir, new_knots, degree, |row| {
            Ok(insert_knot_row(row, &knots, degree, span, t))
        })
    }

    /// Insert the midpoint of every nonempty knot span in every direction.
    pub fn uniform_h_refine(&mut self) -> Result<(), SplineError> {
        for dir in [ParamDir::U, ParamDir::V, ParamDir::W] {
            let mids: Vec<f64> =
                nonempty_spans(self.knots(dir), self.degree(dir), self.num_points(dir))
                    .iter()
                    .map(|(a, b)| 0.5 * (a + b))
                    .collect();
            for t in mids {
                self.insert_knot(dir, t)?;
            }
        }
        Ok(())
    }

    /// Insert `n` knots geometrically graded toward one end of `dir`.
    ///
    /// The knots subdivide the boundary span at `scale^1, .., scale^n` of its
    /// width, measured from the chosen end. `scale` must be in (0, 1).
    pub fn boundary_layer_refine(
        &mut self,
        dir: ParamDir,
        at_start: bool,
        scale: f64,
        n: usize,
    ) -> Result<(), SplineError> {
        if !(scale > 0.0 && scale < 1.0) {
            return Err(SplineError::InvalidParameter(format!(
                "boundary layer scale {} not in (0, 1)",
                scale
            )));
        }
        let spans = nonempty_spans(self.knots(dir), self.degree(dir), self.num_points(dir));
        let (a, b) = if at_start {
            spans[0]
        } else {
            spans[spans.len() - 1]
        };
        for i in 1..=n {
            let r = scale.powi(i as i32);
            let t = if at_start {
                a + (b - a) * r
            } else {
                b - (b - a) * r
            };
            self.insert_knot(dir, t)?;
        }
        Ok(())
    }

    /// Raise the polynomial degree along `dir` by one.
    pub fn raise_degree(&mut self, dir: ParamDir) -> Result<(), SplineError> {
        let knots = self.knots(dir).to_vec();
        let degree = self.degree(dir);
        let elevator = DegreeElevator::new(&knots, degree);
        let new_knots = elevator.knots.clone();
        let new_degree = elevator.degree;
        self.apply_direction(dir, new_knots, new_degree, |row| {
            elevator.elevate_row(row, &knots, degree)
        })
    }

    /// Evaluate one row of the control grid as a curve; used by tests.
    #[cfg(test)]
    fn eval_edge(&self, e: usize, t: f64) -> Point3 {
        let pts = self.edge_points(e);
        let (knots, degree) = match e / 4 {
            0 => (&self.knots_u, self.degree_u),
            1 => (&self.knots_v, self.degree_v),
            _ => (&self.knots_w, self.degree_w),
        };
        crate::eval_row(&pts, knots, degree, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit cube as a trilinear 2x2x2 patch.
    fn unit_cube() -> SplineVolume {
        let mut pts = Vec::new();
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..2 {
                    pts.push(Point3::new(i as f64, j as f64, k as f64));
                }
            }
        }
        let kv = vec![0.0, 0.0, 1.0, 1.0];
        SplineVolume::new(pts, [2, 2, 2], kv.clone(), kv.clone(), kv, [1, 1, 1])
    }

    #[test]
    fn test_trilinear_eval() {
        let cube = unit_cube();
        let p = cube.eval(0.5, 0.5, 0.5);
        assert!((p - Point3::new(0.5, 0.5, 0.5)).norm() < 1e-12);
        let c = cube.eval(1.0, 0.0, 1.0);
        assert!((c - Point3::new(1.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_corner_convention() {
        let cube = unit_cube();
        for c in 0..8 {
            let expect = Point3::new(
                (c & 1) as f64,
                ((c >> 1) & 1) as f64,
                ((c >> 2) & 1) as f64,
            );
            assert!(
                (cube.corner(c) - expect).norm() < 1e-12,
                "corner {} mismatch",
                c
            );
        }
    }

    #[test]
    fn test_edge_points_convention() {
        let cube = unit_cube();
        // Edge 0 runs along u at v=0, w=0
        let e0 = cube.edge_points(0);
        assert_eq!(e0.len(), 2);
        assert!((e0[0] - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((e0[1] - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        // Edge 7 runs along v at u=1, w=1
        let e7 = cube.edge_points(7);
        assert!((e7[0] - Point3::new(1.0, 0.0, 1.0)).norm() < 1e-12);
        assert!((e7[1] - Point3::new(1.0, 1.0, 1.0)).norm() < 1e-12);
        // Edge 10 runs along w at u=0, v=1
        let e10 = cube.edge_points(10);
        assert!((e10[0] - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
        assert!((e10[1] - Point3::new(0.0, 1.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_face_grid_convention() {
        let cube = unit_cube();
        // Face 1 (u max) is gridded over (v, w)
        let f1 = cube.face_grid(1);
        assert_eq!((f1.n1, f1.n2), (2, 2));
        assert!((f1.at(0, 0) - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((f1.at(1, 0) - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
        assert!((f1.at(0, 1) - Point3::new(1.0, 0.0, 1.0)).norm() < 1e-12);
        // Face 4 (w min) is gridded over (u, v)
        let f4 = cube.face_grid(4);
        assert!((f4.at(1, 0) - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((f4.at(0, 1) - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_jacobian_sign() {
        use approx::assert_relative_eq;

        let mut cube = unit_cube();
        // The unit cube maps its parameter box isometrically
        assert_relative_eq!(
            cube.jacobian_determinant(0.5, 0.5, 0.5),
            1.0,
            epsilon = 1e-6
        );
        cube.reverse_direction(ParamDir::U);
        assert_relative_eq!(
            cube.jacobian_determinant(0.5, 0.5, 0.5),
            -1.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_reverse_direction_preserves_geometry() {
        let mut cube = unit_cube();
        let before = cube.eval(0.25, 0.6, 0.8);
        cube.reverse_direction(ParamDir::V);
        let after = cube.eval(0.25, 1.0 - 0.6, 0.8);
        assert!(
            (before - after).norm() < 1e-12,
            "reversal moved the geometry: {:?} vs {:?}",
            before,
            after
        );
        // Reversing twice restores the original parametrization
        cube.reverse_direction(ParamDir::V);
        let restored = cube.eval(0.25, 0.6, 0.8);
        assert!((before - restored).norm() < 1e-12);
    }

    #[test]
    fn test_insert_knot_preserves_geometry() {
        let mut cube = unit_cube();
        let probe = [(0.2, 0.3, 0.9), (0.5, 0.5, 0.5), (1.0, 0.0, 0.7)];
        let before: Vec<Point3> = probe.iter().map(|&(u, v, w)| cube.eval(u, v, w)).collect();
        cube.insert_knot(ParamDir::W, 0.4).unwrap();
        assert_eq!(cube.n_w, 3);
        for (&(u, v, w), p) in probe.iter().zip(&before) {
            let q = cube.eval(u, v, w);
            assert!((p - q).norm() < 1e-12, "geometry changed at {:?}", (u, v, w));
        }
    }

    #[test]
    fn test_insert_knot_outside_domain() {
        let mut cube = unit_cube();
        assert!(cube.insert_knot(ParamDir::U, 0.0).is_err());
        assert!(cube.insert_knot(ParamDir::U, 1.5).is_err());
    }

    #[test]
    fn test_uniform_h_refine_counts() {
        let mut cube = unit_cube();
        cube.uniform_h_refine().unwrap();
        assert_eq!((cube.n_u, cube.n_v, cube.n_w), (3, 3, 3));
        // Geometry unchanged
        let p = cube.eval(0.3, 0.7, 0.1);
        assert!((p - Point3::new(0.3, 0.7, 0.1)).norm() < 1e-12);
    }

    #[test]
    fn test_boundary_layer_refine() {
        let mut cube = unit_cube();
        cube.boundary_layer_refine(ParamDir::U, true, 0.5, 2).unwrap();
        assert_eq!(cube.n_u, 4);
        // Knots clustered toward u=0: 0.25 and 0.5 inserted
        assert!(cube.knots_u.iter().any(|&k| (k - 0.25).abs() < 1e-12));
        assert!(cube.knots_u.iter().any(|&k| (k - 0.5).abs() < 1e-12));
        assert!(cube.boundary_layer_refine(ParamDir::U, true, 1.5, 1).is_err());
    }

    #[test]
    fn test_raise_degree_preserves_geometry() {
        let mut cube = unit_cube();
        cube.raise_degree(ParamDir::U).unwrap();
        assert_eq!(cube.degree_u, 2);
        assert_eq!(cube.n_u, 3);
        for &(u, v, w) in &[(0.0, 0.0, 0.0), (0.3, 0.9, 0.2), (1.0, 1.0, 1.0)] {
            let p = cube.eval(u, v, w);
            assert!(
                (p - Point3::new(u, v, w)).norm() < 1e-10,
                "elevation changed geometry at {:?}",
                (u, v, w)
            );
        }
    }

    #[test]
    fn test_edge_eval_matches_volume() {
        let mut cube = unit_cube();
        cube.uniform_h_refine().unwrap();
        // Edge 3 runs along u at v=1, w=1
        let p = cube.eval_edge(3, 0.5);
        let q = cube.eval(0.5, 1.0, 1.0);
        assert!((p - q).norm() < 1e-12);
    }
}
