#![warn(missing_docs)]

//! Model orchestration for the patchwork preprocessor.
//!
//! [`SplineModel`] owns the patch list of a multipatch assembly (volumes or
//! surfaces, never both), drives topology stitching and right-hand-system
//! enforcement, and generates the global control-point numbering consumed by
//! an analysis solver.
//!
//! The intended pipeline:
//!
//! 1. [`SplineModel::read`] a concatenated patch stream
//! 2. [`SplineModel::enforce_right_hand_system`] (volumetric models)
//! 3. [`SplineModel::build_topology`]
//! 4. [`SplineModel::generate_global_numbers`] and queries on the returned
//!    [`GlobalNumbering`]
//!
//! Mutating the patches — refinement, reversal — invalidates the topology
//! (and any property codes keyed on it); it must be rebuilt and the
//! numbering regenerated before further queries.

use std::io::Write;

use patchwork_math::Tolerance;
use patchwork_spline::io::{read_patches, write_surface, write_volume};
use patchwork_spline::{ParamDir, Patch, SplineSurface, SplineVolume};
use patchwork_topo::TopologySet;

mod error;
mod numbering;
mod properties;

pub use error::ModelError;
pub use numbering::{EdgeRange, FaceRange, GlobalNumbering, SurfaceNumbering, VolumeNumbering};

use properties::PropertyStore;

/// A multipatch spline model: patches, stitched topology, and properties.
#[derive(Debug)]
pub struct SplineModel {
    volumes: Vec<SplineVolume>,
    surfaces: Vec<SplineSurface>,
    volumetric: bool,
    tol: Tolerance,
    topology: Option<TopologySet>,
    properties: PropertyStore,
}

impl SplineModel {
    /// Create a volumetric model from a patch list.
    pub fn from_volumes(volumes: Vec<SplineVolume>) -> Self {
        Self {
            volumes,
            surfaces: Vec::new(),
            volumetric: true,
            tol: Tolerance::DEFAULT,
            topology: None,
            properties: PropertyStore::default(),
        }
    }

    /// Create a surface model from a patch list.
    pub fn from_surfaces(surfaces: Vec<SplineSurface>) -> Self {
        Self {
            volumes: Vec::new(),
            surfaces,
            volumetric: false,
            tol: Tolerance::DEFAULT,
            topology: None,
            properties: PropertyStore::default(),
        }
    }

    /// Read a model from a concatenated patch stream.
    ///
    /// The stream must be surface-only or volume-only; a mixture is
    /// rejected, as is an empty stream.
    pub fn read(input: &str) -> Result<Self, ModelError> {
        let patches = read_patches(input)?;
        if patches.is_empty() {
            return Err(ModelError::EmptyModel);
        }
        let volumetric = patches[0].is_volume();
        let mut volumes = Vec::new();
        let mut surfaces = Vec::new();
        for patch in patches {
            match patch {
                Patch::Volume(v) if volumetric => volumes.push(v),
                Patch::Surface(s) if !volumetric => surfaces.push(s),
                _ => return Err(ModelError::MixedPatchKinds),
            }
        }
        Ok(if volumetric {
            Self::from_volumes(volumes)
        } else {
            Self::from_surfaces(surfaces)
        })
    }

    /// Write the model as a concatenated patch stream.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), ModelError> {
        for vol in &self.volumes {
            write_volume(w, vol)?;
        }
        for srf in &self.surfaces {
            write_surface(w, srf)?;
        }
        Ok(())
    }

    /// True for a volumetric model, false for a surface model.
    pub fn is_volumetric(&self) -> bool {
        self.volumetric
    }

    /// Number of patches.
    pub fn num_patches(&self) -> usize {
        if self.volumetric {
            self.volumes.len()
        } else {
            self.surfaces.len()
        }
    }

    /// The volume patches.
    pub fn volumes(&self) -> &[SplineVolume] {
        &self.volumes
    }

    /// The surface patches.
    pub fn surfaces(&self) -> &[SplineSurface] {
        &self.surfaces
    }

    /// Control point count of `patch` along `dir`.
    pub fn num_points(&self, patch: usize, dir: ParamDir) -> Result<usize, ModelError> {
        self.check_patch(patch)?;
        if self.volumetric {
            Ok(self.volumes[patch].num_points(dir))
        } else {
            if dir == ParamDir::W {
                return Err(ModelError::Spline(
                    patchwork_spline::SplineError::InvalidDirection {
                        dir: dir.index(),
                        rank: 2,
                    },
                ));
            }
            Ok(self.surfaces[patch].num_points(dir))
        }
    }

    /// The matching tolerance in effect.
    pub fn tolerance(&self) -> Tolerance {
        self.tol
    }

    /// Set the matching tolerance. Invalidates any built topology.
    pub fn set_tolerance(&mut self, linear: f64) {
        self.tol = Tolerance::new(linear);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.topology = None;
    }

    fn check_patch(&self, patch: usize) -> Result<(), ModelError> {
        if patch >= self.num_patches() {
            return Err(ModelError::InvalidPatch(patch));
        }
        Ok(())
    }

    fn topology_ref(&self) -> Result<&TopologySet, ModelError> {
        self.topology.as_ref().ok_or(ModelError::TopologyNotBuilt)
    }

    // =========================================================================
    // Topology
    // =========================================================================

    /// Stitch (or re-stitch) the model topology from the current patches.
    ///
    /// Drops any previously set property codes: they are keyed on the
    /// canonical entities of the topology being replaced.
    pub fn build_topology(&mut self) -> Result<(), ModelError> {
        let topo = if self.volumetric {
            TopologySet::build_from_volumes(&self.volumes, self.tol)?
        } else {
            TopologySet::build_from_surfaces(&self.surfaces, self.tol)?
        };
        self.properties.reset(self.num_patches());
        self.topology = Some(topo);
        Ok(())
    }

    /// The stitched topology, if built and current.
    pub fn topology(&self) -> Option<&TopologySet> {
        self.topology.as_ref()
    }

    /// Make every volume patch right-handed.
    ///
    /// Samples the parametric Jacobian at each patch's domain midpoint and
    /// reverses the u direction of any patch with negative sign. Returns
    /// whether any patch changed; if so the topology is invalidated and must
    /// be rebuilt. A second call on the fixed model reports no change.
    /// Surface models are left untouched.
    pub fn enforce_right_hand_system(&mut self) -> bool {
        if !self.volumetric {
            return false;
        }
        let mut changed = false;
        for vol in &mut self.volumes {
            let mid = |d: ParamDir, v: &SplineVolume| {
                let (lo, hi) = v.domain(d);
                0.5 * (lo + hi)
            };
            let (u, v, w) = (
                mid(ParamDir::U, vol),
                mid(ParamDir::V, vol),
                mid(ParamDir::W, vol),
            );
            if vol.jacobian_determinant(u, v, w) < 0.0 {
                vol.reverse_direction(ParamDir::U);
                changed = true;
            }
        }
        if changed {
            self.invalidate();
        }
        changed
    }

    // =========================================================================
    // Refinement
    // =========================================================================

    /// Insert a knot in one patch. Invalidates the topology.
    pub fn knot_insert(&mut self, patch: usize, dir: ParamDir, knot: f64) -> Result<(), ModelError> {
        self.check_patch(patch)?;
        if self.volumetric {
            self.volumes[patch].insert_knot(dir, knot)?;
        } else {
            self.surfaces[patch].insert_knot(dir, knot)?;
        }
        self.invalidate();
        Ok(())
    }

    /// Grade knots toward one boundary of one patch. Invalidates the topology.
    pub fn boundary_layer_refinement(
        &mut self,
        patch: usize,
        dir: ParamDir,
        at_start: bool,
        scale: f64,
        n: usize,
    ) -> Result<(), ModelError> {
        self.check_patch(patch)?;
        if self.volumetric {
            self.volumes[patch].boundary_layer_refine(dir, at_start, scale, n)?;
        } else {
            self.surfaces[patch].boundary_layer_refine(dir, at_start, scale, n)?;
        }
        self.invalidate();
        Ok(())
    }

    /// Halve every nonempty knot span of every patch. Invalidates the topology.
    pub fn uniform_h_refine(&mut self) -> Result<(), ModelError> {
        for vol in &mut self.volumes {
            vol.uniform_h_refine()?;
        }
        for srf in &mut self.surfaces {
            srf.uniform_h_refine()?;
        }
        self.invalidate();
        Ok(())
    }

    /// Raise every patch's degree by one in every direction. Invalidates the
    /// topology.
    pub fn uniform_p_refine(&mut self) -> Result<(), ModelError> {
        for vol in &mut self.volumes {
            for dir in [ParamDir::U, ParamDir::V, ParamDir::W] {
                vol.raise_degree(dir)?;
            }
        }
        for srf in &mut self.surfaces {
            for dir in [ParamDir::U, ParamDir::V] {
                srf.raise_degree(dir)?;
            }
        }
        self.invalidate();
        Ok(())
    }

    // =========================================================================
    // Numbering
    // =========================================================================

    /// Generate the global numbering of the current topology.
    pub fn generate_global_numbers(&self) -> Result<GlobalNumbering, ModelError> {
        let topo = self.topology_ref()?;
        Ok(numbering::generate(
            topo,
            &self.volumes,
            &self.surfaces,
            false,
            0,
        ))
    }

    /// Generate a numbering for a PETSc-oriented solver: indices start at
    /// `start`, and with `mixed` the ranges are sized for a once-elevated
    /// basis (coefficient counting) instead of the stored geometry.
    pub fn generate_global_numbers_petsc(
        &self,
        mixed: bool,
        start: i64,
    ) -> Result<GlobalNumbering, ModelError> {
        let topo = self.topology_ref()?;
        Ok(numbering::generate(
            topo,
            &self.volumes,
            &self.surfaces,
            mixed,
            start,
        ))
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Set a patch-level property code. With `inclusive`, propagate to the
    /// patch's boundary entities where no code is set yet.
    pub fn add_volume_property(
        &mut self,
        patch: usize,
        code: &str,
        inclusive: bool,
    ) -> Result<(), ModelError> {
        self.check_patch(patch)?;
        let topo = self.topology.as_ref().ok_or(ModelError::TopologyNotBuilt)?;
        self.properties
            .set_patch_code(topo, self.volumetric, patch, code, inclusive);
        Ok(())
    }

    /// Set a face property code through a volume patch's local face slot.
    /// With `inclusive`, propagate to the face's lines and vertices where no
    /// code is set yet.
    pub fn add_face_property(
        &mut self,
        patch: usize,
        face: usize,
        code: &str,
        inclusive: bool,
    ) -> Result<(), ModelError> {
        self.check_patch(patch)?;
        if !self.volumetric || face >= 6 {
            return Err(ModelError::InvalidLocalIndex {
                kind: "face",
                index: face,
            });
        }
        let topo = self.topology.as_ref().ok_or(ModelError::TopologyNotBuilt)?;
        self.properties
            .set_face_code(topo, patch, face, code, inclusive);
        Ok(())
    }

    /// Set a line property code through a patch's local edge slot. With
    /// `inclusive`, propagate to the endpoints where no code is set yet.
    pub fn add_line_property(
        &mut self,
        patch: usize,
        line: usize,
        code: &str,
        inclusive: bool,
    ) -> Result<(), ModelError> {
        self.check_patch(patch)?;
        let limit = if self.volumetric { 12 } else { 4 };
        if line >= limit {
            return Err(ModelError::InvalidLocalIndex {
                kind: "line",
                index: line,
            });
        }
        let topo = self.topology.as_ref().ok_or(ModelError::TopologyNotBuilt)?;
        self.properties
            .set_line_code(topo, self.volumetric, patch, line, code, inclusive);
        Ok(())
    }

    /// Set a vertex property code through a patch's local corner slot.
    pub fn add_vertex_property(
        &mut self,
        patch: usize,
        vertex: usize,
        code: &str,
    ) -> Result<(), ModelError> {
        self.check_patch(patch)?;
        let limit = if self.volumetric { 8 } else { 4 };
        if vertex >= limit {
            return Err(ModelError::InvalidLocalIndex {
                kind: "vertex",
                index: vertex,
            });
        }
        let topo = self.topology.as_ref().ok_or(ModelError::TopologyNotBuilt)?;
        self.properties
            .set_vertex_code(topo, self.volumetric, patch, vertex, code);
        Ok(())
    }

    /// Patch-level property code, if set.
    pub fn volume_property(&self, patch: usize) -> Option<&str> {
        self.properties.patch_code(patch)
    }

    /// Face property code through a volume patch's local slot, if set.
    pub fn face_property(&self, patch: usize, face: usize) -> Option<&str> {
        let topo = self.topology.as_ref()?;
        if !self.volumetric || patch >= self.num_patches() || face >= 6 {
            return None;
        }
        self.properties.face_code(topo, patch, face)
    }

    /// Line property code through a patch's local slot, if set.
    pub fn line_property(&self, patch: usize, line: usize) -> Option<&str> {
        let topo = self.topology.as_ref()?;
        let limit = if self.volumetric { 12 } else { 4 };
        if patch >= self.num_patches() || line >= limit {
            return None;
        }
        self.properties
            .line_code(topo, self.volumetric, patch, line)
    }

    /// Vertex property code through a patch's local slot, if set.
    pub fn vertex_property(&self, patch: usize, vertex: usize) -> Option<&str> {
        let topo = self.topology.as_ref()?;
        let limit = if self.volumetric { 8 } else { 4 };
        if patch >= self.num_patches() || vertex >= limit {
            return None;
        }
        self.properties
            .vertex_code(topo, self.volumetric, patch, vertex)
    }

    /// Read property records from a line-oriented stream.
    ///
    /// Applies each record with the default propagation (patch codes
    /// exclusive, face and line codes inclusive). Records that do not parse
    /// or name entities that do not exist are skipped silently.
    pub fn read_properties(&mut self, input: &str) -> Result<(), ModelError> {
        self.topology_ref()?;
        for line in input.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let _ = match tokens.as_slice() {
                ["volume", patch, code] => patch
                    .parse()
                    .map_err(|_| ())
                    .and_then(|p| self.add_volume_property(p, code, false).map_err(|_| ())),
                ["face", patch, slot, code] => parse_pair(patch, slot)
                    .and_then(|(p, s)| self.add_face_property(p, s, code, true).map_err(|_| ())),
                ["line", patch, slot, code] => parse_pair(patch, slot)
                    .and_then(|(p, s)| self.add_line_property(p, s, code, true).map_err(|_| ())),
                ["vertex", patch, slot, code] => parse_pair(patch, slot)
                    .and_then(|(p, s)| self.add_vertex_property(p, s, code).map_err(|_| ())),
                _ => Err(()),
            };
        }
        Ok(())
    }

    /// Write every coded entity as property records.
    pub fn write_properties<W: Write>(&self, w: &mut W) -> Result<(), ModelError> {
        let topo = self.topology_ref()?;
        self.properties.write(topo, self.volumetric, w)?;
        Ok(())
    }
}

fn parse_pair(a: &str, b: &str) -> Result<(usize, usize), ()> {
    match (a.parse(), b.parse()) {
        (Ok(x), Ok(y)) => Ok((x, y)),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_math::Point3;

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

    fn two_cube_model() -> SplineModel {
        let mut model = SplineModel::from_volumes(vec![
            box_volume([0.0; 3], [1.0; 3], [2, 2, 2]),
            box_volume([1.0, 0.0, 0.0], [1.0; 3], [2, 2, 2]),
        ]);
        model.build_topology().unwrap();
        model
    }

    #[test]
    fn test_two_cube_topology_counts() {
        let model = two_cube_model();
        let topo = model.topology().unwrap();
        assert_eq!(topo.num_vertices(), 12);
        assert_eq!(topo.num_lines(), 20);
        assert_eq!(topo.num_faces(), 11);
        assert_eq!(topo.num_volumes(), 2);
    }

    #[test]
    fn test_enforce_right_hand_system_idempotent() {
        let mut left = box_volume([0.0; 3], [1.0; 3], [2, 2, 2]);
        left.reverse_direction(ParamDir::U);
        assert!(left.jacobian_determinant(0.5, 0.5, 0.5) < 0.0);

        let mut model = SplineModel::from_volumes(vec![left]);
        model.build_topology().unwrap();
        assert!(model.enforce_right_hand_system());
        // The rewrite stales the topology
        assert!(model.topology().is_none());
        assert!(model.volumes()[0].jacobian_determinant(0.5, 0.5, 0.5) > 0.0);
        // Second call: nothing to do
        assert!(!model.enforce_right_hand_system());

        model.build_topology().unwrap();
        let numbering = model.generate_global_numbers().unwrap();
        assert_eq!(numbering.total(), 8);
    }

    #[test]
    fn test_numbering_requires_topology() {
        let model = SplineModel::from_volumes(vec![box_volume([0.0; 3], [1.0; 3], [2, 2, 2])]);
        assert!(matches!(
            model.generate_global_numbers(),
            Err(ModelError::TopologyNotBuilt)
        ));
    }

    #[test]
    fn test_refinement_invalidates_topology() {
        let mut model = two_cube_model();
        model.uniform_h_refine().unwrap();
        assert!(model.topology().is_none());
        model.build_topology().unwrap();
        let numbering = model.generate_global_numbers().unwrap();
        // Two 3x3x3 grids sharing a 3x3 face
        assert_eq!(numbering.total(), 2 * 27 - 9);
    }

    #[test]
    fn test_patch_stream_roundtrip() {
        let model = two_cube_model();
        let mut buf = Vec::new();
        model.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut reread = SplineModel::read(&text).unwrap();
        assert!(reread.is_volumetric());
        assert_eq!(reread.num_patches(), 2);
        reread.build_topology().unwrap();
        assert_eq!(reread.topology().unwrap().num_vertices(), 12);
    }

    #[test]
    fn test_mixed_stream_rejected() {
        let mut buf = Vec::new();
        let model = two_cube_model();
        model.write(&mut buf).unwrap();
        let square = "200 1 0 0\n3 0\n2 2\n0 0 1 1\n2 2\n0 0 1 1\n0 0 0\n1 0 0\n0 1 0\n1 1 0\n";
        buf.extend_from_slice(square.as_bytes());
        let text = String::from_utf8(buf).unwrap();
        assert!(matches!(
            SplineModel::read(&text),
            Err(ModelError::MixedPatchKinds)
        ));
        assert!(matches!(SplineModel::read(""), Err(ModelError::EmptyModel)));
    }

    #[test]
    fn test_property_propagation() {
        let mut model = two_cube_model();
        // Face code through patch 0's u-max slot, inclusive
        model.add_face_property(0, 1, "wall", true).unwrap();
        // Visible through patch 1's u-min slot: same canonical face
        assert_eq!(model.face_property(1, 0), Some("wall"));
        // Propagated to a bounding line of that face
        assert_eq!(model.line_property(0, 5), Some("wall"));

        // Patch code propagates inclusively but never overwrites
        model.add_volume_property(0, "fluid", true).unwrap();
        assert_eq!(model.volume_property(0), Some("fluid"));
        assert_eq!(model.face_property(0, 1), Some("wall"));
        assert_eq!(model.face_property(0, 0), Some("fluid"));

        // Direct assignment does overwrite
        model.add_face_property(0, 1, "inlet", false).unwrap();
        assert_eq!(model.face_property(1, 0), Some("inlet"));

        // Out-of-range slots are rejected
        assert!(model.add_face_property(0, 6, "x", false).is_err());
        assert!(model.add_vertex_property(2, 0, "x").is_err());
    }

    #[test]
    fn test_property_stream_roundtrip() {
        let mut model = two_cube_model();
        model.add_volume_property(1, "solid", false).unwrap();
        model.add_face_property(0, 1, "wall", true).unwrap();
        model.add_vertex_property(0, 0, "anchor").unwrap();

        let mut buf = Vec::new();
        model.write_properties(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut reread = two_cube_model();
        reread.read_properties(&text).unwrap();
        assert_eq!(reread.volume_property(1), Some("solid"));
        assert_eq!(reread.face_property(1, 0), Some("wall"));
        assert_eq!(reread.vertex_property(0, 0), Some("anchor"));

        // Junk lines are skipped silently
        reread
            .read_properties("nonsense 1 2 3\nface 99 0 zap\n\n")
            .unwrap();
        assert_eq!(reread.face_property(1, 0), Some("wall"));
    }

    #[test]
    fn test_num_points_query() {
        let model = two_cube_model();
        assert_eq!(model.num_points(0, ParamDir::U).unwrap(), 2);
        assert!(model.num_points(2, ParamDir::U).is_err());
    }
}
