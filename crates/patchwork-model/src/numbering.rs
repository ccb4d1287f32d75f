//! Global control-point numbering.
//!
//! Numbering runs in two phases. First every canonical entity is assigned an
//! index range in a fixed order: vertices one index each, then the interiors
//! of non-degenerate lines, then the interiors of non-degenerate faces, then
//! each volume patch's interior. Second, every patch gets an affine record
//! per local slot — a start index plus signed increments — derived by
//! comparing the patch's local traversal against the canonical entity's
//! stored order. Two patches sharing an entity therefore compute identical
//! global indices at coincident positions, whatever their local
//! parametrizations.
//!
//! Degenerate slots are folded through their collapse: a collapsed edge maps
//! to its vertex, a direction-collapsed face maps onto the canonical line it
//! folds onto (with the face orientation composed in), a point-collapsed
//! face maps to its vertex.
//!
//! Mixed-mode counting sizes every range for a once-degree-elevated basis:
//! per direction the coefficient count is the control count plus the number
//! of nonempty knot spans. Patches sharing an entity must agree on its knot
//! spans, the same conformity the control counts already require.

use std::collections::HashMap;
use std::io::Write;

use patchwork_spline::{ParamDir, SplineSurface, SplineVolume};
use patchwork_topo::{Face, FaceCollapse, FaceOrientation, Line, TopologySet};

/// Affine map of one local edge slot: `global = start + incr * (t - 1)` for
/// interior position `t` counted from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRange {
    /// Global number of the first interior point in local traversal order.
    pub start: i64,
    /// +1 or -1 along the local traversal; 0 for a collapsed edge.
    pub incr: i64,
}

/// Affine map of one local face slot: `global = start + incr_i * (i - 1) +
/// incr_j * (j - 1)` for interior grid position `(i, j)` counted from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRange {
    /// Global number of the first interior grid point in local order.
    pub start: i64,
    /// Signed step along the local first grid direction.
    pub incr_i: i64,
    /// Signed step along the local second grid direction.
    pub incr_j: i64,
}

/// Complete local-to-global map of one volume patch.
#[derive(Debug, Clone)]
pub struct VolumeNumbering {
    /// Global numbers of the 8 corners.
    pub vertex: [i64; 8],
    /// Edge ranges for the 12 edges.
    pub edge: [EdgeRange; 12],
    /// Face ranges for the 6 faces.
    pub face: [FaceRange; 6],
    /// Start of the interior range, numbered u fastest.
    pub interior: i64,
    dims: [usize; 3],
}

impl VolumeNumbering {
    /// The per-direction point counts this record addresses.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }
}

/// Complete local-to-global map of one surface patch.
#[derive(Debug, Clone)]
pub struct SurfaceNumbering {
    /// Global numbers of the 4 corners.
    pub vertex: [i64; 4],
    /// Edge ranges for the 4 edges.
    pub edge: [EdgeRange; 4],
    /// Start of the interior range, numbered u fastest.
    pub interior: i64,
    dims: [usize; 2],
}

impl SurfaceNumbering {
    /// The per-direction point counts this record addresses.
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }
}

/// The global numbering of a whole model: one record per patch plus the
/// overall index range.
#[derive(Debug, Clone)]
pub struct GlobalNumbering {
    volumes: Vec<VolumeNumbering>,
    surfaces: Vec<SurfaceNumbering>,
    start: i64,
    total: i64,
}

// =============================================================================
// Counting
// =============================================================================

fn line_points(line: &Line, mixed: bool) -> usize {
    if mixed {
        line.points.len() + line.spans
    } else {
        line.points.len()
    }
}

fn face_dims(face: &Face, mixed: bool) -> (usize, usize) {
    if mixed {
        (face.n1 + face.spans.0, face.n2 + face.spans.1)
    } else {
        (face.n1, face.n2)
    }
}

fn volume_dims(vol: &SplineVolume, mixed: bool) -> [usize; 3] {
    [ParamDir::U, ParamDir::V, ParamDir::W].map(|d| {
        vol.num_points(d) + if mixed { vol.num_spans(d) } else { 0 }
    })
}

fn surface_dims(srf: &SplineSurface, mixed: bool) -> [usize; 2] {
    [ParamDir::U, ParamDir::V].map(|d| {
        srf.num_points(d) + if mixed { srf.num_spans(d) } else { 0 }
    })
}

// =============================================================================
// Generation
// =============================================================================

/// Canonical affine map of a face in its own grid coordinates: the value at
/// the first interior point plus the coefficients on the two canonical
/// interior offsets. Collapsed faces fold onto their line or vertex.
fn canonical_face_affine(
    face: &Face,
    start: i64,
    topo: &TopologySet,
    vertex_start: &[i64],
    line_start: &[i64],
    mixed: bool,
) -> (i64, i64, i64) {
    let (c1, _) = face_dims(face, mixed);
    let i1 = (c1 - 2) as i64;
    let fold = |on_j: bool| -> (i64, i64, i64) {
        match face.collapse_line {
            Some((lid, rev)) => {
                let n = (line_points(topo.line(lid), mixed) - 2) as i64;
                let s0 = line_start[lid.index()];
                let (lo, step) = if rev {
                    (s0 + (n - 1).max(0), -1)
                } else {
                    (s0, 1)
                };
                if on_j {
                    (lo, 0, step)
                } else {
                    (lo, step, 0)
                }
            }
            None => (vertex_start[face.corners[0].index()], 0, 0),
        }
    };
    match face.collapse {
        FaceCollapse::None => (start, 1, i1),
        FaceCollapse::I => fold(true),
        FaceCollapse::J => fold(false),
        FaceCollapse::Point => (vertex_start[face.corners[0].index()], 0, 0),
    }
}

/// Compose a canonical face map with a patch's local orientation.
fn face_range(
    face: &Face,
    start: i64,
    orientation: FaceOrientation,
    topo: &TopologySet,
    vertex_start: &[i64],
    line_start: &[i64],
    mixed: bool,
) -> FaceRange {
    let (s, a_coef, b_coef) =
        canonical_face_affine(face, start, topo, vertex_start, line_start, mixed);
    let (c1, c2) = face_dims(face, mixed);
    let (i1, i2) = ((c1 - 2) as i64, (c2 - 2) as i64);

    let alpha = if orientation.rev_i { (i1 - 1).max(0) } else { 0 };
    let beta = if orientation.rev_j { (i2 - 1).max(0) } else { 0 };
    let si: i64 = if orientation.rev_i { -1 } else { 1 };
    let sj: i64 = if orientation.rev_j { -1 } else { 1 };
    // Canonical offsets are affine in the local offsets; with swapped axes
    // the local first direction feeds the canonical second one.
    let (incr_i, incr_j) = if orientation.swapped {
        (b_coef * sj, a_coef * si)
    } else {
        (a_coef * si, b_coef * sj)
    };
    FaceRange {
        start: s + a_coef * alpha + b_coef * beta,
        incr_i,
        incr_j,
    }
}

fn edge_range(line: &Line, start: i64, reversed: bool, mixed: bool) -> EdgeRange {
    if line.degenerate {
        return EdgeRange { start, incr: 0 };
    }
    let n = (line_points(line, mixed) - 2) as i64;
    if reversed {
        EdgeRange {
            start: start + (n - 1).max(0),
            incr: -1,
        }
    } else {
        EdgeRange { start, incr: 1 }
    }
}

/// Run the two-phase numbering over a stitched topology.
pub(crate) fn generate(
    topo: &TopologySet,
    volumes: &[SplineVolume],
    surfaces: &[SplineSurface],
    mixed: bool,
    start: i64,
) -> GlobalNumbering {
    let mut next = start;

    // Phase 1: index assignment in canonical order.
    let vertex_start: Vec<i64> = (0..topo.num_vertices())
        .map(|_| {
            let s = next;
            next += 1;
            s
        })
        .collect();

    let line_start: Vec<i64> = topo
        .lines()
        .iter()
        .map(|l| {
            if l.degenerate {
                vertex_start[l.v1.index()]
            } else {
                let s = next;
                next += (line_points(l, mixed) - 2) as i64;
                s
            }
        })
        .collect();

    let face_start: Vec<i64> = topo
        .faces()
        .iter()
        .map(|f| {
            if f.is_degenerate() {
                // Resolved through the collapse when the record is built
                0
            } else {
                let (c1, c2) = face_dims(f, mixed);
                let s = next;
                next += ((c1 - 2) * (c2 - 2)) as i64;
                s
            }
        })
        .collect();

    // Phase 2: per-patch affine records (volume interiors are assigned here,
    // in patch order).
    let volume_records: Vec<VolumeNumbering> = volumes
        .iter()
        .enumerate()
        .map(|(p, vol)| {
            let prim = topo.volume_primitives(p);
            let mut vertex = [0i64; 8];
            for (slot, id) in vertex.iter_mut().zip(prim.vertices.iter()) {
                *slot = vertex_start[id.index()];
            }
            let mut edge = [EdgeRange { start: 0, incr: 0 }; 12];
            for (slot, er) in edge.iter_mut().zip(prim.edges.iter()) {
                let line = topo.line(er.line);
                *slot = edge_range(line, line_start[er.line.index()], er.reversed, mixed);
            }
            let mut face = [FaceRange {
                start: 0,
                incr_i: 0,
                incr_j: 0,
            }; 6];
            for (slot, fr) in face.iter_mut().zip(prim.faces.iter()) {
                let f = topo.face(fr.face);
                *slot = face_range(
                    f,
                    face_start[fr.face.index()],
                    fr.orientation,
                    topo,
                    &vertex_start,
                    &line_start,
                    mixed,
                );
            }
            let dims = volume_dims(vol, mixed);
            let interior = next;
            next += ((dims[0] - 2) * (dims[1] - 2) * (dims[2] - 2)) as i64;
            VolumeNumbering {
                vertex,
                edge,
                face,
                interior,
                dims,
            }
        })
        .collect();

    let surface_records: Vec<SurfaceNumbering> = surfaces
        .iter()
        .enumerate()
        .map(|(p, srf)| {
            let prim = topo.surface_primitives(p);
            let mut vertex = [0i64; 4];
            for (slot, id) in vertex.iter_mut().zip(prim.vertices.iter()) {
                *slot = vertex_start[id.index()];
            }
            let mut edge = [EdgeRange { start: 0, incr: 0 }; 4];
            for (slot, er) in edge.iter_mut().zip(prim.edges.iter()) {
                let line = topo.line(er.line);
                *slot = edge_range(line, line_start[er.line.index()], er.reversed, mixed);
            }
            let f = topo.face(prim.face.face);
            let (interior, _, _) = canonical_face_affine(
                f,
                face_start[prim.face.face.index()],
                topo,
                &vertex_start,
                &line_start,
                mixed,
            );
            SurfaceNumbering {
                vertex,
                edge,
                interior,
                dims: surface_dims(srf, mixed),
            }
        })
        .collect();

    GlobalNumbering {
        volumes: volume_records,
        surfaces: surface_records,
        start,
        total: next - start,
    }
}

// =============================================================================
// Queries
// =============================================================================

enum Zone {
    Lo,
    Hi,
    In(usize),
}

fn zone(idx: usize, n: usize) -> Zone {
    assert!(idx < n, "local index {} out of range (n = {})", idx, n);
    if idx == 0 {
        Zone::Lo
    } else if idx == n - 1 {
        Zone::Hi
    } else {
        Zone::In(idx)
    }
}

fn end(z: &Zone) -> usize {
    match z {
        Zone::Lo => 0,
        Zone::Hi => 1,
        Zone::In(_) => unreachable!("interior zone has no end"),
    }
}

impl GlobalNumbering {
    /// The numbering offset (first index assigned).
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Number of distinct global indices assigned.
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Per-patch records of a volumetric model.
    pub fn volume_records(&self) -> &[VolumeNumbering] {
        &self.volumes
    }

    /// Per-patch records of a surface model.
    pub fn surface_records(&self) -> &[SurfaceNumbering] {
        &self.surfaces
    }

    /// Global number of the control point at local grid position
    /// `(i, j[, k])` of `patch`. O(1): evaluates the stored affine record.
    ///
    /// # Panics
    /// Panics if the patch or a local index is out of range, or if `k` is
    /// given for a surface model (or missing for a volumetric one).
    pub fn global_number(&self, patch: usize, i: usize, j: usize, k: Option<usize>) -> i64 {
        if let Some(k) = k {
            let rec = &self.volumes[patch];
            let [nu, nv, nw] = rec.dims;
            let (zu, zv, zw) = (zone(i, nu), zone(j, nv), zone(k, nw));
            match (&zu, &zv, &zw) {
                (Zone::In(x), Zone::In(y), Zone::In(z)) => {
                    rec.interior
                        + (x - 1) as i64
                        + (y - 1) as i64 * (nu - 2) as i64
                        + (z - 1) as i64 * ((nu - 2) * (nv - 2)) as i64
                }
                (Zone::In(x), Zone::In(y), _) => face_value(&rec.face[4 + end(&zw)], *x, *y),
                (Zone::In(x), _, Zone::In(z)) => face_value(&rec.face[2 + end(&zv)], *x, *z),
                (_, Zone::In(y), Zone::In(z)) => face_value(&rec.face[end(&zu)], *y, *z),
                (Zone::In(t), _, _) => edge_value(&rec.edge[end(&zv) + 2 * end(&zw)], *t),
                (_, Zone::In(t), _) => edge_value(&rec.edge[4 + end(&zu) + 2 * end(&zw)], *t),
                (_, _, Zone::In(t)) => edge_value(&rec.edge[8 + end(&zu) + 2 * end(&zv)], *t),
                _ => rec.vertex[end(&zu) + 2 * end(&zv) + 4 * end(&zw)],
            }
        } else {
            let rec = &self.surfaces[patch];
            let [nu, nv] = rec.dims;
            let (zu, zv) = (zone(i, nu), zone(j, nv));
            match (&zu, &zv) {
                (Zone::In(x), Zone::In(y)) => {
                    rec.interior + (x - 1) as i64 + (y - 1) as i64 * (nu - 2) as i64
                }
                (Zone::In(t), _) => edge_value(&rec.edge[end(&zv)], *t),
                (_, Zone::In(t)) => edge_value(&rec.edge[2 + end(&zu)], *t),
                _ => rec.vertex[end(&zu) + 2 * end(&zv)],
            }
        }
    }

    /// Global numbers of every control point of every patch, each patch in
    /// local lexicographic order (u fastest).
    pub fn global_numbering(&self) -> Vec<Vec<i64>> {
        if self.surfaces.is_empty() {
            (0..self.volumes.len())
                .map(|p| {
                    let [nu, nv, nw] = self.volumes[p].dims;
                    let mut out = Vec::with_capacity(nu * nv * nw);
                    for k in 0..nw {
                        for j in 0..nv {
                            for i in 0..nu {
                                out.push(self.global_number(p, i, j, Some(k)));
                            }
                        }
                    }
                    out
                })
                .collect()
        } else {
            (0..self.surfaces.len())
                .map(|p| {
                    let [nu, nv] = self.surfaces[p].dims;
                    let mut out = Vec::with_capacity(nu * nv);
                    for j in 0..nv {
                        for i in 0..nu {
                            out.push(self.global_number(p, i, j, None));
                        }
                    }
                    out
                })
                .collect()
        }
    }

    /// Rewrite a numbering in first-visit ("natural") order: indices are
    /// renamed by the order they first appear when walking patches in input
    /// order and points lexicographically. The result is a bijection of the
    /// original index set onto the same range.
    pub fn renumber_natural(&self, num: &mut [Vec<i64>]) {
        let mut perm: HashMap<i64, i64> = HashMap::new();
        let mut fresh = self.start;
        for patch in num.iter() {
            for &g in patch {
                perm.entry(g).or_insert_with(|| {
                    let v = fresh;
                    fresh += 1;
                    v
                });
            }
        }
        for patch in num.iter_mut() {
            for g in patch.iter_mut() {
                *g = perm[g];
            }
        }
    }

    /// The natural (first-visit) numbering of the model.
    pub fn natural_numbering(&self) -> Vec<Vec<i64>> {
        let mut num = self.global_numbering();
        self.renumber_natural(&mut num);
        num
    }

    /// Write the numbering file: one fixed-cardinality record per patch, in
    /// patch input order.
    pub fn write_gno<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        fn int_row(vals: &[i64]) -> String {
            vals.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        }
        for rec in &self.volumes {
            writeln!(w, "{}", int_row(&rec.vertex))?;
            for e in &rec.edge {
                writeln!(w, "{} {}", e.start, e.incr)?;
            }
            for f in &rec.face {
                writeln!(w, "{} {} {}", f.start, f.incr_i, f.incr_j)?;
            }
            writeln!(w, "{}", rec.interior)?;
        }
        for rec in &self.surfaces {
            writeln!(w, "{}", int_row(&rec.vertex))?;
            for e in &rec.edge {
                writeln!(w, "{} {}", e.start, e.incr)?;
            }
            writeln!(w, "{}", rec.interior)?;
        }
        Ok(())
    }
}

fn edge_value(e: &EdgeRange, t: usize) -> i64 {
    e.start + e.incr * (t - 1) as i64
}

fn face_value(f: &FaceRange, i: usize, j: usize) -> i64 {
    f.start + f.incr_i * (i - 1) as i64 + f.incr_j * (j - 1) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_math::{Point3, Tolerance};
    use std::collections::BTreeMap;

    /// Axis-aligned box as a degree-1 volume patch with `n` points per direction.
    fn box_volume(origin: [f64; 3], size: [f64; 3], n: [usize; 3]) -> SplineVolume {
        let coord = |d: usize, i: usize| origin[d] + size[d] * i as f64 / (n[d] - 1) as f64;
        let mut pts = Vec::new();
        for k in 0..n[2] {
            for j in 0..n[1] {
                for i in 0..n[0] {
                    pts.push(Point3::new(coord(0, i), coord(1, j), coord(2, k)));
                }
            }
        }
        let knots = |count: usize| {
            let mut kv = vec![0.0];
            kv.extend((0..count).map(|i| i as f64 / (count - 1) as f64));
            kv.push(1.0);
            kv
        };
        SplineVolume::new(pts, n, knots(n[0]), knots(n[1]), knots(n[2]), [1, 1, 1])
    }

    fn key(p: &Point3) -> (i64, i64, i64) {
        let q = 1.0 / 1e-6;
        (
            (p.x * q).round() as i64,
            (p.y * q).round() as i64,
            (p.z * q).round() as i64,
        )
    }

    /// Every physical control point must map to exactly one global index,
    /// and the indices must form a contiguous range from `start`.
    fn assert_consistent(volumes: &[SplineVolume], numbering: &GlobalNumbering) {
        let mut by_pos: BTreeMap<(i64, i64, i64), i64> = BTreeMap::new();
        let mut seen = std::collections::HashSet::new();
        for (p, vol) in volumes.iter().enumerate() {
            for k in 0..vol.n_w {
                for j in 0..vol.n_v {
                    for i in 0..vol.n_u {
                        let g = numbering.global_number(p, i, j, Some(k));
                        let pos = key(vol.cp(i, j, k));
                        if let Some(&prev) = by_pos.get(&pos) {
                            assert_eq!(
                                prev, g,
                                "patch {} point ({}, {}, {}) got {} but another patch got {}",
                                p, i, j, k, g, prev
                            );
                        } else {
                            by_pos.insert(pos, g);
                        }
                        seen.insert(g);
                    }
                }
            }
        }
        // Contiguous bijection over the assigned range
        let mut sorted: Vec<i64> = seen.into_iter().collect();
        sorted.sort_unstable();
        let expect: Vec<i64> =
            (numbering.start()..numbering.start() + numbering.total()).collect();
        assert_eq!(sorted, expect, "indices are not a contiguous bijection");
    }

    fn number_volumes(volumes: &[SplineVolume], mixed: bool, start: i64) -> GlobalNumbering {
        let topo = TopologySet::build_from_volumes(volumes, Tolerance::DEFAULT).unwrap();
        generate(&topo, volumes, &[], mixed, start)
    }

    #[test]
    fn test_two_trilinear_cubes() {
        let volumes = vec![
            box_volume([0.0; 3], [1.0; 3], [2, 2, 2]),
            box_volume([1.0, 0.0, 0.0], [1.0; 3], [2, 2, 2]),
        ];
        let numbering = number_volumes(&volumes, false, 0);
        // 12 canonical vertices, nothing else
        assert_eq!(numbering.total(), 12);
        assert_consistent(&volumes, &numbering);

        // The 4 shared corners resolve identically from both patches
        for (ca, cb) in [(1, 0), (3, 2), (5, 4), (7, 6)] {
            let a = numbering.global_number(0, 1, (ca >> 1) & 1, Some((ca >> 2) & 1));
            let b = numbering.global_number(1, 0, (cb >> 1) & 1, Some((cb >> 2) & 1));
            assert_eq!(a, b, "corner pair ({}, {}) disagrees", ca, cb);
        }
    }

    #[test]
    fn test_shared_face_interior() {
        let volumes = vec![
            box_volume([0.0; 3], [1.0; 3], [4, 4, 4]),
            box_volume([1.0, 0.0, 0.0], [1.0; 3], [4, 4, 4]),
        ];
        let numbering = number_volumes(&volumes, false, 0);
        // vertices 12, lines 20 with 2 interior each, faces 11 with 4 each,
        // volumes 2 with 8 each
        assert_eq!(numbering.total(), 12 + 20 * 2 + 11 * 4 + 2 * 8);
        assert_consistent(&volumes, &numbering);
    }

    #[test]
    fn test_reversed_neighbor_consistency() {
        let a = box_volume([0.0; 3], [1.0; 3], [4, 4, 4]);
        let mut b = box_volume([1.0, 0.0, 0.0], [1.0; 3], [4, 4, 4]);
        b.reverse_direction(ParamDir::V);
        b.reverse_direction(ParamDir::W);
        let volumes = vec![a, b];
        let numbering = number_volumes(&volumes, false, 0);
        assert_consistent(&volumes, &numbering);
    }

    #[test]
    fn test_swapped_neighbor_consistency() {
        // Patch b parametrizes the same box with its v along z and w along y,
        // so the shared face grids are transposed between the two patches.
        let a = box_volume([0.0; 3], [1.0; 3], [4, 4, 4]);
        let n = 4;
        let mut pts = Vec::new();
        let c = |i: usize| i as f64 / (n - 1) as f64;
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    pts.push(Point3::new(1.0 + c(i), c(k), c(j)));
                }
            }
        }
        let knots = |count: usize| {
            let mut kv = vec![0.0];
            kv.extend((0..count).map(|i| i as f64 / (count - 1) as f64));
            kv.push(1.0);
            kv
        };
        let b = SplineVolume::new(
            pts,
            [n, n, n],
            knots(n),
            knots(n),
            knots(n),
            [1, 1, 1],
        );
        let volumes = vec![a, b];
        let numbering = number_volumes(&volumes, false, 0);
        assert_consistent(&volumes, &numbering);

        // The shared face really is transposed
        let topo = TopologySet::build_from_volumes(&volumes, Tolerance::DEFAULT).unwrap();
        let fb = topo.volume_primitives(1).faces[0];
        assert_eq!(fb.face, topo.volume_primitives(0).faces[1].face);
        assert!(fb.orientation.swapped);
    }

    #[test]
    fn test_wedge_degenerate_numbering() {
        // Top layer collapses onto the ridge y = 0.5, z = 1: every local
        // (i, j, k=2) with the same i is the same physical point.
        let n = 3;
        let c = |i: usize| i as f64 / (n - 1) as f64;
        let mut pts = Vec::new();
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    let t = c(k);
                    let y = c(j) * (1.0 - t) + 0.5 * t;
                    pts.push(Point3::new(c(i), y, t));
                }
            }
        }
        let knots = vec![0.0, 0.0, 0.5, 1.0, 1.0];
        let wedge = SplineVolume::new(
            pts,
            [n, n, n],
            knots.clone(),
            knots.clone(),
            knots,
            [1, 1, 1],
        );
        let volumes = vec![wedge];
        let numbering = number_volumes(&volumes, false, 0);
        assert_consistent(&volumes, &numbering);
    }

    #[test]
    fn test_offset_numbering() {
        let volumes = vec![box_volume([0.0; 3], [1.0; 3], [3, 3, 3])];
        let numbering = number_volumes(&volumes, false, 100);
        assert_eq!(numbering.start(), 100);
        assert_eq!(numbering.total(), 27);
        assert_consistent(&volumes, &numbering);
        assert_eq!(numbering.global_number(0, 0, 0, Some(0)), 100);
    }

    #[test]
    fn test_mixed_counting_matches_elevated_model() {
        // Mixed mode sizes ranges for a once-elevated basis; elevating the
        // patches and numbering normally must give the same total.
        let volumes = vec![
            box_volume([0.0; 3], [1.0; 3], [2, 2, 2]),
            box_volume([1.0, 0.0, 0.0], [1.0; 3], [2, 2, 2]),
        ];
        let mixed = number_volumes(&volumes, true, 0);

        let mut elevated = volumes.clone();
        for vol in &mut elevated {
            for dir in [ParamDir::U, ParamDir::V, ParamDir::W] {
                vol.raise_degree(dir).unwrap();
            }
        }
        let plain = number_volumes(&elevated, false, 0);
        assert_eq!(mixed.total(), plain.total());
        // Two 3x3x3 grids sharing a 3x3 face
        assert_eq!(mixed.total(), 2 * 27 - 9);
    }

    #[test]
    fn test_natural_numbering_is_bijection() {
        let volumes = vec![
            box_volume([0.0; 3], [1.0; 3], [3, 3, 3]),
            box_volume([1.0, 0.0, 0.0], [1.0; 3], [3, 3, 3]),
        ];
        let numbering = number_volumes(&volumes, false, 0);
        let natural = numbering.natural_numbering();

        // Same index set, renamed
        let mut all: Vec<i64> = natural.iter().flatten().copied().collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len() as i64, numbering.total());
        assert_eq!(all[0], 0);
        assert_eq!(all[all.len() - 1], numbering.total() - 1);

        // First-visit order: patch 0's points are numbered 0.. in sequence
        let first: Vec<i64> = natural[0].clone();
        let mut expect = first.clone();
        expect.sort_unstable();
        expect.dedup();
        assert_eq!(first.len(), 27);
        assert_eq!(expect.len(), 27);
        assert_eq!(first, (0..27).collect::<Vec<i64>>());
    }

    #[test]
    fn test_surface_model_numbering() {
        let square = |x0: f64| {
            let n = 3;
            let c = |i: usize| i as f64 / (n - 1) as f64;
            let mut pts = Vec::new();
            for j in 0..n {
                for i in 0..n {
                    pts.push(Point3::new(x0 + c(i), c(j), 0.0));
                }
            }
            let knots = vec![0.0, 0.0, 0.5, 1.0, 1.0];
            SplineSurface::new(pts, [n, n], knots.clone(), knots, [1, 1])
        };
        let surfaces = vec![square(0.0), square(1.0)];
        let topo = TopologySet::build_from_surfaces(&surfaces, Tolerance::DEFAULT).unwrap();
        let numbering = generate(&topo, &[], &surfaces, false, 0);
        // 6 vertices + 7 lines x 1 interior + 2 faces x 1 interior
        assert_eq!(numbering.total(), 15);

        // Coincident points along the shared edge agree
        let mut by_pos: BTreeMap<(i64, i64, i64), i64> = BTreeMap::new();
        let mut seen = std::collections::HashSet::new();
        for (p, srf) in surfaces.iter().enumerate() {
            for j in 0..srf.n_v {
                for i in 0..srf.n_u {
                    let g = numbering.global_number(p, i, j, None);
                    let pos = key(srf.cp(i, j));
                    if let Some(&prev) = by_pos.get(&pos) {
                        assert_eq!(prev, g, "patch {} point ({}, {}) disagrees", p, i, j);
                    } else {
                        by_pos.insert(pos, g);
                    }
                    seen.insert(g);
                }
            }
        }
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn test_gno_record_shape() {
        let volumes = vec![box_volume([0.0; 3], [1.0; 3], [3, 3, 3])];
        let numbering = number_volumes(&volumes, false, 0);
        let mut buf = Vec::new();
        numbering.write_gno(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // 1 corner line + 12 edge lines + 6 face lines + 1 interior line
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0].split_whitespace().count(), 8);
        assert_eq!(lines[1].split_whitespace().count(), 2);
        assert_eq!(lines[13].split_whitespace().count(), 3);
        assert_eq!(lines[19], "26");
    }
}
