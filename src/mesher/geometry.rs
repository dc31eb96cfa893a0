//! Indexed triangle meshes produced by the cube mesher.

/// A colored mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    /// Palette RGBA scaled to `[0, 1]`, still sRGB-encoded.
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// A triangle list over one shared vertex pool. Indices are 0-based.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Append a vertex, returning its index.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    /// Append the quad `a b c d` as triangles `a b c` and `a c d`.
    pub fn push_quad(&mut self, [a, b, c, d]: [u32; 4]) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Component-wise min and max of all positions; zeros for an empty mesh.
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let Some(first) = self.vertices.first() else {
            return ([0.0; 3], [0.0; 3]);
        };
        self.vertices
            .iter()
            .fold((first.position, first.position), |(mut lo, mut hi), v| {
                for axis in 0..3 {
                    lo[axis] = lo[axis].min(v.position[axis]);
                    hi[axis] = hi[axis].max(v.position[axis]);
                }
                (lo, hi)
            })
    }

    pub fn positions_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.position).collect()
    }
}
