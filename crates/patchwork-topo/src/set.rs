//! Canonical entity arenas and the patch-stitching pass.
//!
//! `TopologySet` interns every patch's corners, edges, and faces into
//! per-kind arenas, deduplicating by tolerance-based geometric comparison.
//! Vertices are bucketed in a spatial hash grid so candidate lookups touch
//! only the 27 neighboring cells; lines and faces are bucketed by their
//! canonical endpoint ids, which any tolerance-equal entity necessarily
//! shares.

use std::collections::HashMap;

use patchwork_math::{Point3, Tolerance};
use patchwork_spline::{FaceGrid, ParamDir, SplineSurface, SplineVolume};

use crate::primitives::{
    surface_edge_corners, volume_edge_corners, volume_edge_dir, volume_face_corners, EdgeRef,
    Face, FaceCollapse, FaceId, FaceOrientation, FaceRef, Line, LineId, SurfacePrimitives,
    Vertex, VertexId, VolumePrimitives,
};
use crate::TopologyError;

/// Spatial hash grid over vertex positions.
///
/// Cell size equals the matching tolerance, so every tolerance-equal pair
/// lands within one cell of each other and the 27-cell Moore neighborhood
/// is a complete candidate set.
#[derive(Debug)]
struct VertexGrid {
    cell: f64,
    cells: HashMap<(i64, i64, i64), Vec<VertexId>>,
}

impl VertexGrid {
    fn new(tol: Tolerance) -> Self {
        Self {
            cell: tol.linear.max(1e-12),
            cells: HashMap::new(),
        }
    }

    fn key(&self, p: &Point3) -> (i64, i64, i64) {
        (
            (p.x / self.cell).floor() as i64,
            (p.y / self.cell).floor() as i64,
            (p.z / self.cell).floor() as i64,
        )
    }

    fn insert(&mut self, p: &Point3, id: VertexId) {
        self.cells.entry(self.key(p)).or_default().push(id);
    }

    fn neighborhood(&self, p: &Point3) -> Vec<VertexId> {
        let (x, y, z) = self.key(p);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(ids) = self.cells.get(&(x + dx, y + dy, z + dz)) {
                        out.extend_from_slice(ids);
                    }
                }
            }
        }
        out
    }
}

/// Canonical, deduplicated topology of a whole patch assembly.
#[derive(Debug)]
pub struct TopologySet {
    tol: Tolerance,
    vertices: Vec<Vertex>,
    lines: Vec<Line>,
    faces: Vec<Face>,
    volumes: Vec<VolumePrimitives>,
    surfaces: Vec<SurfacePrimitives>,
    grid: VertexGrid,
    line_buckets: HashMap<(VertexId, VertexId), Vec<LineId>>,
    face_buckets: HashMap<[VertexId; 4], Vec<FaceId>>,
}

impl TopologySet {
    fn new(tol: Tolerance) -> Self {
        Self {
            tol,
            vertices: Vec::new(),
            lines: Vec::new(),
            faces: Vec::new(),
            volumes: Vec::new(),
            surfaces: Vec::new(),
            grid: VertexGrid::new(tol),
            line_buckets: HashMap::new(),
            face_buckets: HashMap::new(),
        }
    }

    /// Stitch the topology of a volumetric patch assembly.
    pub fn build_from_volumes(
        patches: &[SplineVolume],
        tol: Tolerance,
    ) -> Result<Self, TopologyError> {
        let mut set = Self::new(tol);
        for vol in patches {
            let mut vertices = [VertexId(0); 8];
            for (c, slot) in vertices.iter_mut().enumerate() {
                *slot = set.intern_vertex(vol.corner(c))?;
            }

            let mut edges = [EdgeRef {
                line: LineId(0),
                reversed: false,
            }; 12];
            for (e, slot) in edges.iter_mut().enumerate() {
                let (a, b) = volume_edge_corners(e);
                let dir = match volume_edge_dir(e) {
                    0 => ParamDir::U,
                    1 => ParamDir::V,
                    _ => ParamDir::W,
                };
                let (line, reversed) = set.intern_line(
                    vol.edge_points(e),
                    vertices[a],
                    vertices[b],
                    vol.num_spans(dir),
                )?;
                *slot = EdgeRef { line, reversed };
            }

            let mut faces = [FaceRef {
                face: FaceId(0),
                orientation: FaceOrientation::IDENTITY,
            }; 6];
            for (f, slot) in faces.iter_mut().enumerate() {
                let corners = volume_face_corners(f).map(|c| vertices[c]);
                let spans = match f / 2 {
                    0 => (vol.num_spans(ParamDir::V), vol.num_spans(ParamDir::W)),
                    1 => (vol.num_spans(ParamDir::U), vol.num_spans(ParamDir::W)),
                    _ => (vol.num_spans(ParamDir::U), vol.num_spans(ParamDir::V)),
                };
                let (face, orientation) = set.intern_face(vol.face_grid(f), corners, spans)?;
                *slot = FaceRef { face, orientation };
            }

            set.volumes.push(VolumePrimitives {
                vertices,
                edges,
                faces,
            });
        }
        Ok(set)
    }

    /// Stitch the topology of a surface patch assembly.
    pub fn build_from_surfaces(
        patches: &[SplineSurface],
        tol: Tolerance,
    ) -> Result<Self, TopologyError> {
        let mut set = Self::new(tol);
        for srf in patches {
            let mut vertices = [VertexId(0); 4];
            for (c, slot) in vertices.iter_mut().enumerate() {
                *slot = set.intern_vertex(srf.corner(c))?;
            }

            let mut edges = [EdgeRef {
                line: LineId(0),
                reversed: false,
            }; 4];
            for (e, slot) in edges.iter_mut().enumerate() {
                let (a, b) = surface_edge_corners(e);
                let dir = if e < 2 { ParamDir::U } else { ParamDir::V };
                let (line, reversed) = set.intern_line(
                    srf.edge_points(e),
                    vertices[a],
                    vertices[b],
                    srf.num_spans(dir),
                )?;
                *slot = EdgeRef { line, reversed };
            }

            let spans = (srf.num_spans(ParamDir::U), srf.num_spans(ParamDir::V));
            let (face, orientation) = set.intern_face(srf.grid(), vertices, spans)?;

            set.surfaces.push(SurfacePrimitives {
                vertices,
                edges,
                face: FaceRef { face, orientation },
            });
        }
        Ok(set)
    }

    // =========================================================================
    // Interning
    // =========================================================================

    fn intern_vertex(&mut self, point: Point3) -> Result<VertexId, TopologyError> {
        let hits: Vec<VertexId> = self
            .grid
            .neighborhood(&point)
            .into_iter()
            .filter(|id| {
                self.tol
                    .points_equal(&self.vertices[id.index()].point, &point)
            })
            .collect();
        match hits.len() {
            0 => {
                let id = VertexId(self.vertices.len() as u32);
                self.vertices.push(Vertex { point });
                self.grid.insert(&point, id);
                Ok(id)
            }
            1 => Ok(hits[0]),
            n => Err(TopologyError::AmbiguousMatch {
                kind: "vertex",
                count: n,
                tol: self.tol.linear,
            }),
        }
    }

    fn line_key(v1: VertexId, v2: VertexId) -> (VertexId, VertexId) {
        if v1 <= v2 {
            (v1, v2)
        } else {
            (v2, v1)
        }
    }

    fn intern_line(
        &mut self,
        points: Vec<Point3>,
        v1: VertexId,
        v2: VertexId,
        spans: usize,
    ) -> Result<(LineId, bool), TopologyError> {
        let key = Self::line_key(v1, v2);
        let hits: Vec<(LineId, bool)> = self
            .line_buckets
            .get(&key)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter_map(|&id| {
                        self.lines[id.index()]
                            .matches(&points, self.tol)
                            .map(|rev| (id, rev))
                    })
                    .collect()
            })
            .unwrap_or_default();
        match hits.len() {
            0 => {
                let id = LineId(self.lines.len() as u32);
                self.lines.push(Line {
                    points,
                    v1,
                    v2,
                    degenerate: v1 == v2,
                    spans,
                });
                self.line_buckets.entry(key).or_default().push(id);
                Ok((id, false))
            }
            1 => Ok(hits[0]),
            n => Err(TopologyError::AmbiguousMatch {
                kind: "line",
                count: n,
                tol: self.tol.linear,
            }),
        }
    }

    fn face_key(corners: &[VertexId; 4]) -> [VertexId; 4] {
        let mut key = *corners;
        key.sort();
        key
    }

    fn intern_face(
        &mut self,
        grid: FaceGrid,
        corners: [VertexId; 4],
        spans: (usize, usize),
    ) -> Result<(FaceId, FaceOrientation), TopologyError> {
        let key = Self::face_key(&corners);
        let hits: Vec<(FaceId, FaceOrientation)> = self
            .face_buckets
            .get(&key)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter_map(|&id| {
                        self.faces[id.index()]
                            .matches(&grid, self.tol)
                            .map(|orientation| (id, orientation))
                    })
                    .collect()
            })
            .unwrap_or_default();
        match hits.len() {
            0 => {
                let collapse = classify_collapse(&corners);
                let collapse_line = match collapse {
                    FaceCollapse::I => {
                        // Folds onto the line along the second grid direction
                        let col: Vec<Point3> = (0..grid.n2).map(|j| *grid.at(0, j)).collect();
                        let (id, rev) = self.intern_line(col, corners[0], corners[2], spans.1)?;
                        Some((id, rev))
                    }
                    FaceCollapse::J => {
                        // Folds onto the line along the first grid direction
                        let row: Vec<Point3> = (0..grid.n1).map(|i| *grid.at(i, 0)).collect();
                        let (id, rev) = self.intern_line(row, corners[0], corners[1], spans.0)?;
                        Some((id, rev))
                    }
                    _ => None,
                };
                let id = FaceId(self.faces.len() as u32);
                self.faces.push(Face {
                    points: grid.points,
                    n1: grid.n1,
                    n2: grid.n2,
                    corners,
                    collapse,
                    collapse_line,
                    spans,
                });
                self.face_buckets.entry(key).or_default().push(id);
                Ok((id, FaceOrientation::IDENTITY))
            }
            1 => Ok(hits[0]),
            n => Err(TopologyError::AmbiguousMatch {
                kind: "face",
                count: n,
                tol: self.tol.linear,
            }),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The matching tolerance in effect.
    pub fn tolerance(&self) -> Tolerance {
        self.tol
    }

    /// Number of canonical vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of canonical lines.
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Number of canonical lines with distinct endpoints.
    pub fn num_nondegenerate_lines(&self) -> usize {
        self.lines.iter().filter(|l| !l.degenerate).count()
    }

    /// Number of canonical faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of canonical faces that are not collapsed.
    pub fn num_nondegenerate_faces(&self) -> usize {
        self.faces.iter().filter(|f| !f.is_degenerate()).count()
    }

    /// Number of volume patches stitched into this set.
    pub fn num_volumes(&self) -> usize {
        self.volumes.len()
    }

    /// Number of surface patches stitched into this set.
    pub fn num_surface_patches(&self) -> usize {
        self.surfaces.len()
    }

    /// Canonical vertices in arena (insertion) order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Canonical lines in arena order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Canonical faces in arena order.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// A canonical vertex by id.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// A canonical line by id.
    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.index()]
    }

    /// A canonical face by id.
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// The primitive set of volume patch `i`.
    pub fn volume_primitives(&self, i: usize) -> &VolumePrimitives {
        &self.volumes[i]
    }

    /// The primitive set of surface patch `i`.
    pub fn surface_primitives(&self, i: usize) -> &SurfacePrimitives {
        &self.surfaces[i]
    }
}

/// Classify how a face's corner cycle collapses.
fn classify_collapse(corners: &[VertexId; 4]) -> FaceCollapse {
    let [c00, c10, c01, c11] = *corners;
    if c00 == c10 && c00 == c01 && c00 == c11 {
        FaceCollapse::Point
    } else if c00 == c10 && c01 == c11 {
        FaceCollapse::I
    } else if c00 == c01 && c10 == c11 {
        FaceCollapse::J
    } else {
        FaceCollapse::None
    }
}
