//! Property codes attached to topological entities.
//!
//! Codes live on canonical entities, so a code set through one patch's face
//! slot is visible through every patch sharing that face. Direct assignment
//! overwrites; `inclusive` assignment additionally propagates to the
//! entity's boundary sub-entities, without overwriting anything already set
//! more broadly.
//!
//! The text format is line oriented and whitespace delimited:
//! `volume <patch> <code>`, `face <patch> <slot> <code>`,
//! `line <patch> <slot> <code>`, `vertex <patch> <slot> <code>`. The
//! `volume` keyword names a whole patch in surface models too. Records are
//! unvalidated by design: lines that do not parse, or that name entities
//! that do not exist, are skipped silently.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use patchwork_topo::{
    volume_face_corners, volume_face_edges, FaceId, LineId, TopologySet, VertexId,
};

/// Codes per entity kind, keyed by canonical ids (patch codes by patch index).
#[derive(Debug, Default, Clone)]
pub(crate) struct PropertyStore {
    patches: Vec<Option<String>>,
    faces: HashMap<FaceId, String>,
    lines: HashMap<LineId, String>,
    vertices: HashMap<VertexId, String>,
}

impl PropertyStore {
    /// Drop every code and resize for a freshly built topology.
    pub(crate) fn reset(&mut self, num_patches: usize) {
        self.patches = vec![None; num_patches];
        self.faces.clear();
        self.lines.clear();
        self.vertices.clear();
    }

    pub(crate) fn set_patch_code(
        &mut self,
        topo: &TopologySet,
        volumetric: bool,
        patch: usize,
        code: &str,
        inclusive: bool,
    ) {
        self.patches[patch] = Some(code.to_string());
        if !inclusive {
            return;
        }
        if volumetric {
            let prim = topo.volume_primitives(patch);
            for fr in &prim.faces {
                self.faces
                    .entry(fr.face)
                    .or_insert_with(|| code.to_string());
            }
            for er in &prim.edges {
                self.lines
                    .entry(er.line)
                    .or_insert_with(|| code.to_string());
            }
            for v in &prim.vertices {
                self.vertices.entry(*v).or_insert_with(|| code.to_string());
            }
        } else {
            let prim = topo.surface_primitives(patch);
            for er in &prim.edges {
                self.lines
                    .entry(er.line)
                    .or_insert_with(|| code.to_string());
            }
            for v in &prim.vertices {
                self.vertices.entry(*v).or_insert_with(|| code.to_string());
            }
        }
    }

    pub(crate) fn set_face_code(
        &mut self,
        topo: &TopologySet,
        patch: usize,
        slot: usize,
        code: &str,
        inclusive: bool,
    ) {
        let prim = topo.volume_primitives(patch);
        self.faces
            .insert(prim.faces[slot].face, code.to_string());
        if !inclusive {
            return;
        }
        for e in volume_face_edges(slot) {
            self.lines
                .entry(prim.edges[e].line)
                .or_insert_with(|| code.to_string());
        }
        for c in volume_face_corners(slot) {
            self.vertices
                .entry(prim.vertices[c])
                .or_insert_with(|| code.to_string());
        }
    }

    pub(crate) fn set_line_code(
        &mut self,
        topo: &TopologySet,
        volumetric: bool,
        patch: usize,
        slot: usize,
        code: &str,
        inclusive: bool,
    ) {
        let line_id = if volumetric {
            topo.volume_primitives(patch).edges[slot].line
        } else {
            topo.surface_primitives(patch).edges[slot].line
        };
        self.lines.insert(line_id, code.to_string());
        if !inclusive {
            return;
        }
        let line = topo.line(line_id);
        for v in [line.v1, line.v2] {
            self.vertices.entry(v).or_insert_with(|| code.to_string());
        }
    }

    pub(crate) fn set_vertex_code(
        &mut self,
        topo: &TopologySet,
        volumetric: bool,
        patch: usize,
        slot: usize,
        code: &str,
    ) {
        let vertex_id = if volumetric {
            topo.volume_primitives(patch).vertices[slot]
        } else {
            topo.surface_primitives(patch).vertices[slot]
        };
        self.vertices.insert(vertex_id, code.to_string());
    }

    pub(crate) fn patch_code(&self, patch: usize) -> Option<&str> {
        self.patches.get(patch)?.as_deref()
    }

    pub(crate) fn face_code(&self, topo: &TopologySet, patch: usize, slot: usize) -> Option<&str> {
        let id = topo.volume_primitives(patch).faces[slot].face;
        self.faces.get(&id).map(String::as_str)
    }

    pub(crate) fn line_code(
        &self,
        topo: &TopologySet,
        volumetric: bool,
        patch: usize,
        slot: usize,
    ) -> Option<&str> {
        let id = if volumetric {
            topo.volume_primitives(patch).edges[slot].line
        } else {
            topo.surface_primitives(patch).edges[slot].line
        };
        self.lines.get(&id).map(String::as_str)
    }

    pub(crate) fn vertex_code(
        &self,
        topo: &TopologySet,
        volumetric: bool,
        patch: usize,
        slot: usize,
    ) -> Option<&str> {
        let id = if volumetric {
            topo.volume_primitives(patch).vertices[slot]
        } else {
            topo.surface_primitives(patch).vertices[slot]
        };
        self.vertices.get(&id).map(String::as_str)
    }

    /// Write every coded entity, one line each. Shared canonical entities
    /// are emitted once, through the first patch slot that reaches them.
    pub(crate) fn write<W: Write>(
        &self,
        topo: &TopologySet,
        volumetric: bool,
        w: &mut W,
    ) -> std::io::Result<()> {
        let mut done_faces: HashSet<FaceId> = HashSet::new();
        let mut done_lines: HashSet<LineId> = HashSet::new();
        let mut done_vertices: HashSet<VertexId> = HashSet::new();

        for patch in 0..self.patches.len() {
            if let Some(code) = self.patch_code(patch) {
                writeln!(w, "volume {} {}", patch, code)?;
            }
            if volumetric {
                let prim = topo.volume_primitives(patch);
                for (slot, fr) in prim.faces.iter().enumerate() {
                    if let Some(code) = self.faces.get(&fr.face) {
                        if done_faces.insert(fr.face) {
                            writeln!(w, "face {} {} {}", patch, slot, code)?;
                        }
                    }
                }
                for (slot, er) in prim.edges.iter().enumerate() {
                    if let Some(code) = self.lines.get(&er.line) {
                        if done_lines.insert(er.line) {
                            writeln!(w, "line {} {} {}", patch, slot, code)?;
                        }
                    }
                }
                for (slot, v) in prim.vertices.iter().enumerate() {
                    if let Some(code) = self.vertices.get(v) {
                        if done_vertices.insert(*v) {
                            writeln!(w, "vertex {} {} {}", patch, slot, code)?;
                        }
                    }
                }
            } else {
                let prim = topo.surface_primitives(patch);
                for (slot, er) in prim.edges.iter().enumerate() {
                    if let Some(code) = self.lines.get(&er.line) {
                        if done_lines.insert(er.line) {
                            writeln!(w, "line {} {} {}", patch, slot, code)?;
                        }
                    }
                }
                for (slot, v) in prim.vertices.iter().enumerate() {
                    if let Some(code) = self.vertices.get(v) {
                        if done_vertices.insert(*v) {
                            writeln!(w, "vertex {} {} {}", patch, slot, code)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
