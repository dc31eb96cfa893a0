//! Minimal Wavefront OBJ reader.
//!
//! Only `v` and `f` records are read. Faces keep their first three vertex
//! references; quads and larger polygons are truncated, not triangulated.

use crate::error::GeometryError;
use glam::DVec3;
use log::warn;

/// Vertices and triangles read from OBJ text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    pub vertices: Vec<DVec3>,
    /// 0-based vertex indices, all in range.
    pub faces: Vec<[usize; 3]>,
}

impl ObjMesh {
    /// Parse OBJ text.
    ///
    /// Vertex records must carry three numeric coordinates. Faces that cannot
    /// be used (fewer than three references, bad numbers, indices outside the
    /// vertex list) are dropped with a warning.
    pub fn parse(text: &str) -> Result<Self, GeometryError> {
        let mut vertices = Vec::new();
        // (line, resolved indices) until every vertex is known
        let mut pending_faces: Vec<(usize, [i64; 3])> = Vec::new();

        for (line_idx, line) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    let vertex = parse_vertex(tokens).ok_or_else(|| GeometryError::InvalidVertex {
                        line: line_no,
                        text: line.trim().to_string(),
                    })?;
                    vertices.push(vertex);
                }
                Some("f") => match parse_face(tokens, vertices.len()) {
                    Some(face) => pending_faces.push((line_no, face)),
                    None => warn!("skipping unusable face on line {}: {:?}", line_no, line.trim()),
                },
                _ => {}
            }
        }

        let faces = pending_faces
            .into_iter()
            .filter_map(|(line_no, face)| {
                let resolved = resolve_face(face, vertices.len());
                if resolved.is_none() {
                    warn!("skipping face on line {}: vertex index out of range", line_no);
                }
                resolved
            })
            .collect();

        Ok(Self { vertices, faces })
    }

    /// The three corner positions of a face.
    pub fn triangle(&self, face: [usize; 3]) -> [DVec3; 3] {
        face.map(|i| self.vertices[i])
    }
}

fn parse_vertex<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Option<DVec3> {
    let mut coords = [0.0f64; 3];
    for coord in &mut coords {
        let value: f64 = tokens.next()?.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *coord = value;
    }
    Some(DVec3::from_array(coords))
}

/// Read the first three references of a face as 0-based indices.
///
/// Negative references count back from the most recent vertex.
fn parse_face<'a>(mut tokens: impl Iterator<Item = &'a str>, vertex_count: usize) -> Option<[i64; 3]> {
    let mut face = [0i64; 3];
    for slot in &mut face {
        let token = tokens.next()?;
        let index: i64 = token.split('/').next()?.parse().ok()?;
        *slot = match index {
            0 => return None,
            i if i > 0 => i - 1,
            i => vertex_count as i64 + i,
        };
    }
    Some(face)
}

fn resolve_face(face: [i64; 3], vertex_count: usize) -> Option<[usize; 3]> {
    let mut resolved = [0usize; 3];
    for (slot, index) in resolved.iter_mut().zip(face) {
        let index = usize::try_from(index).ok()?;
        if index >= vertex_count {
            return None;
        }
        *slot = index;
    }
    Some(resolved)
}
