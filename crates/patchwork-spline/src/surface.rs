//! Bivariate tensor-product B-spline surfaces.
//!
//! Control points are stored u-fastest: `points[j * n_u + i]`. Corner `c`
//! has local ends `(c & 1, c >> 1 & 1)`; edges 0/1 run along u at the v
//! ends, edges 2/3 run along v at the u ends.

use patchwork_math::Point3;

use crate::volume::FaceGrid;
use crate::{
    basis_functions, find_span, insert_knot_row, inserted_knots, knot_domain, nonempty_spans,
    reflected_knots, validate_knots, DegreeElevator, ParamDir, SplineError,
};

/// A non-rational bivariate tensor-product B-spline surface.
#[derive(Debug, Clone)]
pub struct SplineSurface {
    /// Control points, u fastest.
    pub control_points: Vec<Point3>,
    /// Number of control points in u.
    pub n_u: usize,
    /// Number of control points in v.
    pub n_v: usize,
    /// Knot vector in u. Length = n_u + degree_u + 1.
    pub knots_u: Vec<f64>,
    /// Knot vector in v.
    pub knots_v: Vec<f64>,
    /// Polynomial degree in u.
    pub degree_u: usize,
    /// Polynomial degree in v.
    pub degree_v: usize,
}

impl SplineSurface {
    /// Create a B-spline surface.
    ///
    /// # Panics
    /// Panics if the control grid or a knot vector has the wrong size.
    pub fn new(
        control_points: Vec<Point3>,
        n: [usize; 2],
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        degrees: [usize; 2],
    ) -> Self {
        let [n_u, n_v] = n;
        let [degree_u, degree_v] = degrees;
        assert_eq!(
            control_points.len(),
            n_u * n_v,
            "control point count mismatch: {} != {} * {}",
            control_points.len(),
            n_u,
            n_v
        );
        assert!(
            validate_knots(&knots_u, n_u, degree_u),
            "invalid u knot vector"
        );
        assert!(
            validate_knots(&knots_v, n_v, degree_v),
            "invalid v knot vector"
        );
        Self {
            control_points,
            n_u,
            n_v,
            knots_u,
            knots_v,
            degree_u,
            degree_v,
        }
    }

    fn idx(&self, i: usize, j: usize) -> usize {
        j * self.n_u + i
    }

    /// Control point at grid position `(i, j)`.
    pub fn cp(&self, i: usize, j: usize) -> &Point3 {
        &self.control_points[self.idx(i, j)]
    }

    fn check_dir(&self, dir: ParamDir) -> Result<(), SplineError> {
        if dir == ParamDir::W {
            return Err(SplineError::InvalidDirection {
                dir: dir.index(),
                rank: 2,
            });
        }
        Ok(())
    }

    /// Number of control points along `dir` (u or v).
    ///
    /// # Panics
    /// Panics on [`ParamDir::W`].
    pub fn num_points(&self, dir: ParamDir) -> usize {
        match dir {
            ParamDir::U => self.n_u,
            ParamDir::V => self.n_v,
            ParamDir::W => panic!("surface patch has no w direction"),
        }
    }

    /// Polynomial degree along `dir`.
    ///
    /// # Panics
    /// Panics on [`ParamDir::W`].
    pub fn degree(&self, dir: ParamDir) -> usize {
        match dir {
            ParamDir::U => self.degree_u,
            ParamDir::V => self.degree_v,
            ParamDir::W => panic!("surface patch has no w direction"),
        }
    }

    fn knots(&self, dir: ParamDir) -> &[f64] {
        match dir {
            ParamDir::U => &self.knots_u,
            ParamDir::V => &self.knots_v,
            ParamDir::W => panic!("surface patch has no w direction"),
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

    /// Evaluate the surface at `(u, v)` using tensor-product De Boor.
    pub fn eval(&self, u: f64, v: f64) -> Point3 {
        let nu = self.n_u - 1;
        let nv = self.n_v - 1;
        let u = u.clamp(self.knots_u[self.degree_u], self.knots_u[nu + 1]);
        let v = v.clamp(self.knots_v[self.degree_v], self.knots_v[nv + 1]);

        let span_u = find_span(&self.knots_u, nu, self.degree_u, u);
        let span_v = find_span(&self.knots_v, nv, self.degree_v, v);
        let basis_u = basis_functions(&self.knots_u, span_u, self.degree_u, u);
        let basis_v = basis_functions(&self.knots_v, span_v, self.degree_v, v);

        let mut point = Point3::origin();
        for (j, &bv) in basis_v.iter().enumerate() {
            let j_idx = span_v - self.degree_v + j;
            for (i, &bu) in basis_u.iter().enumerate() {
                let i_idx = span_u - self.degree_u + i;
                let weight = bu * bv;
                let cp = self.cp(i_idx, j_idx);
                point.x += weight * cp.x;
                point.y += weight * cp.y;
                point.z += weight * cp.z;
            }
        }
        point
    }

    /// Control point at corner `c` (0–3, bits = u/v ends).
    pub fn corner(&self, c: usize) -> Point3 {
        assert!(c < 4, "corner index out of range: {}", c);
        let i = (c & 1) * (self.n_u - 1);
        let j = ((c >> 1) & 1) * (self.n_v - 1);
        *self.cp(i, j)
    }

    /// Ordered control points along edge `e` (0–3).
    ///
    /// Edges 0/1 run along u at v ends 0/1; edges 2/3 run along v at u ends.
    pub fn edge_points(&self, e: usize) -> Vec<Point3> {
        assert!(e < 4, "edge index out of range: {}", e);
        if e < 2 {
            let j = (e & 1) * (self.n_v - 1);
            (0..self.n_u).map(|i| *self.cp(i, j)).collect()
        } else {
            let i = (e - 2) * (self.n_u - 1);
            (0..self.n_v).map(|j| *self.cp(i, j)).collect()
        }
    }

    /// The full control grid as a [`FaceGrid`].
    pub fn grid(&self) -> FaceGrid {
        FaceGrid {
            points: self.control_points.clone(),
            n1: self.n_u,
            n2: self.n_v,
        }
    }

    /// Apply a row operation along `dir`, replacing the direction's knot
    /// vector and degree.
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
        self.check_dir(dir)?;
        let (nu, nv) = (self.n_u, self.n_v);
        let new_n = new_knots.len() - new_degree - 1;
        let mut scratch = Vec::new();

        match dir {
            ParamDir::U => {
                let mut out = vec![Point3::origin(); new_n * nv];
                for j in 0..nv {
                    scratch.clear();
                    scratch.extend((0..nu).map(|i| *self.cp(i, j)));
                    for (m, p) in op(&scratch)?.into_iter().enumerate() {
                        out[j * new_n + m] = p;
                    }
                }
                self.control_points = out;
                self.n_u = new_n;
                self.knots_u = new_knots;
                self.degree_u = new_degree;
            }
            _ => {
                let mut out = vec![Point3::origin(); nu * new_n];
                for i in 0..nu {
                    scratch.clear();
                    scratch.extend((0..nv).map(|j| *self.cp(i, j)));
                    for (m, p) in op(&scratch)?.into_iter().enumerate() {
                        out[m * nu + i] = p;
                    }
                }
                self.control_points = out;
                self.n_v = new_n;
                self.knots_v = new_knots;
                self.degree_v = new_degree;
            }
        }
        Ok(())
    }

    /// Reverse the parametric direction `dir` (u or v).
    pub fn reverse_direction(&mut self, dir: ParamDir) -> Result<(), SplineError> {
        self.check_dir(dir)?;
        let new_knots = reflected_knots(self.knots(dir));
        let degree = self.degree(dir);
        self.apply_direction(dir, new_knots, degree, |row| {
            Ok(row.iter().rev().copied().collect())
        })
    }

    /// Insert a knot at `t` along `dir` using Boehm's algorithm.
    pub fn insert_knot(&mut self, dir: ParamDir, t: f64) -> Result<(), SplineError> {
        self.check_dir(dir)?;
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

    /// Insert the midpoint of every nonempty knot span in both directions.
    pub fn uniform_h_refine(&mut self) -> Result<(), SplineError> {
        for dir in [ParamDir::U, ParamDir::V] {
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
    pub fn boundary_layer_refine(
        &mut self,
        dir: ParamDir,
        at_start: bool,
        scale: f64,
        n: usize,
    ) -> Result<(), SplineError> {
        self.check_dir(dir)?;
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
        self.check_dir(dir)?;
        let knots = self.knots(dir).to_vec();
        let degree = self.degree(dir);
        let elevator = DegreeElevator::new(&knots, degree);
        let new_knots = elevator.knots.clone();
        let new_degree = elevator.degree;
        self.apply_direction(dir, new_knots, new_degree, |row| {
            elevator.elevate_row(row, &knots, degree)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit square as a bilinear 2x2 patch.
    fn unit_square() -> SplineSurface {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let kv = vec![0.0, 0.0, 1.0, 1.0];
        SplineSurface::new(pts, [2, 2], kv.clone(), kv, [1, 1])
    }

    #[test]
    fn test_bilinear_eval() {
        let sq = unit_square();
        let p = sq.eval(0.5, 0.5);
        assert!((p - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_corner_and_edges() {
        let sq = unit_square();
        assert!((sq.corner(3) - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
        // Edge 2 runs along v at u=0
        let e2 = sq.edge_points(2);
        assert!((e2[0] - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((e2[1] - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_w_direction_rejected() {
        let mut sq = unit_square();
        assert!(sq.insert_knot(ParamDir::W, 0.5).is_err());
        assert!(sq.reverse_direction(ParamDir::W).is_err());
        assert!(sq.raise_degree(ParamDir::W).is_err());
    }

    #[test]
    fn test_reverse_preserves_geometry() {
        let mut sq = unit_square();
        let before = sq.eval(0.3, 0.8);
        sq.reverse_direction(ParamDir::U).unwrap();
        let after = sq.eval(0.7, 0.8);
        assert!((before - after).norm() < 1e-12);
    }

    #[test]
    fn test_refinement_counts() {
        let mut sq = unit_square();
        sq.uniform_h_refine().unwrap();
        assert_eq!((sq.n_u, sq.n_v), (3, 3));
        sq.raise_degree(ParamDir::V).unwrap();
        assert_eq!(sq.degree_v, 2);
        // Two spans in v after h-refinement: one extra point per span
        assert_eq!(sq.n_v, 5);
        let p = sq.eval(0.25, 0.65);
        assert!((p - Point3::new(0.25, 0.65, 0.0)).norm() < 1e-10);
    }
}
