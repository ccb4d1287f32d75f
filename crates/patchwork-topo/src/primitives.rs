//! Topological primitives and hexahedron combinatorics.
//!
//! Canonical entities live in per-kind arenas inside
//! [`TopologySet`](crate::TopologySet); everything here refers to them
//! through integer id newtypes. Geometric comparison is orientation
//! insensitive: lines try both traversal directions, faces try the eight
//! grid symmetries.
//!
//! Local conventions for a volume patch: corner `c` in 0–7 has parametric
//! ends `(c & 1, c >> 1 & 1, c >> 2 & 1)`; edges 0–3 run along u, 4–7 along
//! v, 8–11 along w, ordered by the ends of the two frozen directions; faces
//! are min/max pairs per direction (0/1 = u, 2/3 = v, 4/5 = w).

use patchwork_math::{Point3, Tolerance};
use patchwork_spline::FaceGrid;

/// Index of a canonical vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub u32);

/// Index of a canonical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(pub u32);

/// Index of a canonical face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub u32);

impl VertexId {
    /// Arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl LineId {
    /// Arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FaceId {
    /// Arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Canonical entities
// =============================================================================

/// A canonical corner vertex.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position of the vertex.
    pub point: Point3,
}

/// A canonical edge line: the ordered control points between two vertices.
#[derive(Debug, Clone)]
pub struct Line {
    /// Control points in the canonical traversal order.
    pub points: Vec<Point3>,
    /// Vertex at the first control point.
    pub v1: VertexId,
    /// Vertex at the last control point.
    pub v2: VertexId,
    /// True if the endpoints coincide (collapsed edge).
    pub degenerate: bool,
    /// Nonempty knot spans along the edge, for elevated-basis counting.
    pub spans: usize,
}

impl Line {
    /// Compare against a candidate point sequence, trying both traversal
    /// directions. Returns `Some(reversed)` on a match, where `reversed`
    /// tells whether the candidate runs opposite to the canonical order.
    ///
    /// The direction is picked by the candidate's first point; a first-point
    /// hit followed by any pair further than `tol` apart fails outright.
    pub fn matches(&self, candidate: &[Point3], tol: Tolerance) -> Option<bool> {
        if candidate.len() != self.points.len() {
            return None;
        }
        if tol.points_equal(&candidate[0], &self.points[0]) {
            for (a, b) in candidate.iter().zip(self.points.iter()) {
                if !tol.points_equal(a, b) {
                    return None;
                }
            }
            Some(false)
        } else if tol.points_equal(&candidate[0], &self.points[self.points.len() - 1]) {
            for (a, b) in candidate.iter().zip(self.points.iter().rev()) {
                if !tol.points_equal(a, b) {
                    return None;
                }
            }
            Some(true)
        } else {
            None
        }
    }
}

/// How a face's corner cycle collapses, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceCollapse {
    /// Proper face.
    None,
    /// Collapsed along the first grid direction (both i-edges degenerate).
    I,
    /// Collapsed along the second grid direction.
    J,
    /// Collapsed to a single point.
    Point,
}

/// A canonical boundary face: a 2D grid of control points.
#[derive(Debug, Clone)]
pub struct Face {
    /// Grid points, first index fastest.
    pub points: Vec<Point3>,
    /// Point count along the first grid direction.
    pub n1: usize,
    /// Point count along the second grid direction.
    pub n2: usize,
    /// Corner vertices in grid order: `(0,0), (1,0), (0,1), (1,1)`.
    pub corners: [VertexId; 4],
    /// Collapse classification from the corner cycle.
    pub collapse: FaceCollapse,
    /// For a direction collapse, the canonical line the face folds onto and
    /// whether that line runs opposite to the surviving grid direction.
    pub collapse_line: Option<(LineId, bool)>,
    /// Nonempty knot spans along the two grid directions.
    pub spans: (usize, usize),
}

impl Face {
    /// Grid point at `(i1, i2)`.
    pub fn at(&self, i1: usize, i2: usize) -> &Point3 {
        &self.points[i2 * self.n1 + i1]
    }

    /// True if the face is collapsed in any way.
    pub fn is_degenerate(&self) -> bool {
        self.collapse != FaceCollapse::None
    }

    /// Compare against a candidate grid, trying the eight symmetries that
    /// preserve a consistent boundary cycle (direction reversals and axis
    /// swap). Returns the orientation mapping candidate coordinates onto
    /// canonical coordinates on a match.
    pub fn matches(&self, candidate: &FaceGrid, tol: Tolerance) -> Option<FaceOrientation> {
        for swapped in [false, true] {
            let dims_ok = if swapped {
                candidate.n1 == self.n2 && candidate.n2 == self.n1
            } else {
                candidate.n1 == self.n1 && candidate.n2 == self.n2
            };
            if !dims_ok {
                continue;
            }
            for rev_i in [false, true] {
                for rev_j in [false, true] {
                    let orientation = FaceOrientation {
                        swapped,
                        rev_i,
                        rev_j,
                    };
                    if self.matches_oriented(candidate, orientation, tol) {
                        return Some(orientation);
                    }
                }
            }
        }
        None
    }

    fn matches_oriented(
        &self,
        candidate: &FaceGrid,
        orientation: FaceOrientation,
        tol: Tolerance,
    ) -> bool {
        for j in 0..candidate.n2 {
            for i in 0..candidate.n1 {
                let (ci, cj) = orientation.map(i, j, self.n1, self.n2);
                if !tol.points_equal(candidate.at(i, j), self.at(ci, cj)) {
                    return false;
                }
            }
        }
        true
    }
}

/// Orientation of a patch-local face grid relative to its canonical face.
///
/// Maps local coordinates `(i, j)` to canonical coordinates: the axes are
/// swapped first, then each canonical axis is optionally reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceOrientation {
    /// Local i runs along the canonical second axis.
    pub swapped: bool,
    /// Canonical first axis is traversed in reverse.
    pub rev_i: bool,
    /// Canonical second axis is traversed in reverse.
    pub rev_j: bool,
}

impl FaceOrientation {
    /// The identity orientation.
    pub const IDENTITY: Self = Self {
        swapped: false,
        rev_i: false,
        rev_j: false,
    };

    /// Map local `(i, j)` to canonical `(ci, cj)` for a canonical grid of
    /// `n1 x n2` points.
    pub fn map(&self, i: usize, j: usize, n1: usize, n2: usize) -> (usize, usize) {
        let (a, b) = if self.swapped { (j, i) } else { (i, j) };
        let ci = if self.rev_i { n1 - 1 - a } else { a };
        let cj = if self.rev_j { n2 - 1 - b } else { b };
        (ci, cj)
    }
}

// =============================================================================
// Per-patch primitive sets
// =============================================================================

/// A patch's reference to a canonical line.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRef {
    /// The canonical line.
    pub line: LineId,
    /// True if the patch traverses the line opposite to its canonical order.
    pub reversed: bool,
}

/// A patch's reference to a canonical face.
#[derive(Debug, Clone, Copy)]
pub struct FaceRef {
    /// The canonical face.
    pub face: FaceId,
    /// Orientation of the patch-local grid relative to the canonical grid.
    pub orientation: FaceOrientation,
}

/// The full primitive set of one volume patch.
#[derive(Debug, Clone)]
pub struct VolumePrimitives {
    /// Canonical vertices at the 8 corners.
    pub vertices: [VertexId; 8],
    /// Canonical lines at the 12 edges.
    pub edges: [EdgeRef; 12],
    /// Canonical faces at the 6 boundary faces.
    pub faces: [FaceRef; 6],
}

/// The full primitive set of one surface patch.
#[derive(Debug, Clone)]
pub struct SurfacePrimitives {
    /// Canonical vertices at the 4 corners.
    pub vertices: [VertexId; 4],
    /// Canonical lines at the 4 edges.
    pub edges: [EdgeRef; 4],
    /// The patch's own canonical face.
    pub face: FaceRef,
}

// =============================================================================
// Hexahedron combinatorics
// =============================================================================

/// Local edge slot of a hexahedron from an unordered corner pair.
///
/// Classifies the pair by the absolute index difference: 1 selects a u-edge
/// (`lo / 2`), 2 a v-edge (`(lo + hi) / 4 + 4`), 4 a w-edge (`lo + 8`).
/// Any other difference, or an out-of-range corner, yields `None`.
pub fn line_enumeration(a: usize, b: usize) -> Option<usize> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi > 7 {
        return None;
    }
    match hi - lo {
        1 => Some(lo / 2),
        2 => Some((lo + hi) / 4 + 4),
        4 => Some(lo + 8),
        _ => None,
    }
}

/// Corner pair `(from, to)` of a volume edge slot, in traversal order.
pub fn volume_edge_corners(e: usize) -> (usize, usize) {
    assert!(e < 12, "edge slot out of range: {}", e);
    match e / 4 {
        0 => {
            let s = e;
            let base = ((s >> 1) & 1) * 4 + (s & 1) * 2;
            (base, base + 1)
        }
        1 => {
            let s = e - 4;
            let base = ((s >> 1) & 1) * 4 + (s & 1);
            (base, base + 2)
        }
        _ => {
            let s = e - 8;
            let base = ((s >> 1) & 1) * 2 + (s & 1);
            (base, base + 4)
        }
    }
}

/// Parametric direction (0, 1, 2) a volume edge slot runs along.
pub fn volume_edge_dir(e: usize) -> usize {
    assert!(e < 12, "edge slot out of range: {}", e);
    e / 4
}

/// Corner slots of a volume face, in face-grid order `(0,0), (1,0), (0,1), (1,1)`.
pub fn volume_face_corners(f: usize) -> [usize; 4] {
    assert!(f < 6, "face slot out of range: {}", f);
    let end = f & 1;
    match f / 2 {
        0 => [end, end + 2, end + 4, end + 6],
        1 => {
            let base = end * 2;
            [base, base + 1, base + 4, base + 5]
        }
        _ => {
            let base = end * 4;
            [base, base + 1, base + 2, base + 3]
        }
    }
}

/// Edge slots bounding a volume face.
pub fn volume_face_edges(f: usize) -> [usize; 4] {
    assert!(f < 6, "face slot out of range: {}", f);
    let end = f & 1;
    match f / 2 {
        0 => [4 + end, 6 + end, 8 + end, 10 + end],
        1 => [end, 2 + end, 8 + 2 * end, 9 + 2 * end],
        _ => [2 * end, 2 * end + 1, 4 + 2 * end, 5 + 2 * end],
    }
}

/// Corner pair `(from, to)` of a surface edge slot.
pub fn surface_edge_corners(e: usize) -> (usize, usize) {
    assert!(e < 4, "edge slot out of range: {}", e);
    if e < 2 {
        (e * 2, e * 2 + 1)
    } else {
        (e - 2, e)
    }
}
