//! Per-voxel cube mesh generation.
//!
//! Every voxel becomes its own unit cube: 8 corner vertices and 6 quads
//! split into 12 triangles. Adjacent voxels are not merged, so faces
//! between neighbors are emitted twice.

pub mod geometry;

pub use geometry::{Mesh, Vertex};

use crate::palette::ZeroIndex;
use crate::types::VoxModel;

/// Unit cube corners, in output order.
pub const CUBE_CORNERS: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// Cube faces as quads of 0-based corner indices. Each quad `a b c d` is
/// split into `a b c` and `a c d`.
pub const CUBE_QUADS: [[u32; 4]; 6] = [
    [0, 1, 2, 3],
    [7, 6, 5, 4],
    [4, 5, 1, 0],
    [1, 5, 6, 2],
    [2, 6, 7, 3],
    [4, 0, 3, 7],
];

/// Options for turning a model into a mesh.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Edge length of one voxel cube in output units.
    pub cube_size: f32,
    /// Name written on the OBJ object line.
    pub object_name: String,
    /// Append palette colors to OBJ vertex lines (`v x y z r g b`).
    pub vertex_colors: bool,
    /// How voxels with color index 0 are treated.
    pub zero_index: ZeroIndex,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            cube_size: 1.0,
            object_name: "vox_model".to_string(),
            vertex_colors: false,
            zero_index: ZeroIndex::Clamp,
        }
    }
}

impl ExportOptions {
    pub fn with_cube_size(mut self, cube_size: f32) -> Self {
        self.cube_size = cube_size;
        self
    }

    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = name.into();
        self
    }

    pub fn with_vertex_colors(mut self, enabled: bool) -> Self {
        self.vertex_colors = enabled;
        self
    }

    pub fn with_zero_index(mut self, zero_index: ZeroIndex) -> Self {
        self.zero_index = zero_index;
        self
    }
}

/// Builds cube meshes from voxel models.
pub struct CubeMesher {
    options: ExportOptions,
}

impl Default for CubeMesher {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeMesher {
    /// Create a new mesher with default options.
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Emit one cube per voxel, colored from the model's palette.
    pub fn mesh(&self, model: &VoxModel) -> Mesh {
        let size = self.options.cube_size;
        let mut mesh = Mesh::with_capacity(model.voxels.len() * 8, model.voxels.len() * 12);

        for voxel in &model.voxels {
            let Some(color) = model.palette.color(voxel.color_index, self.options.zero_index)
            else {
                continue;
            };
            let color = color.to_f32();
            let base = [
                voxel.x as f32 * size,
                voxel.y as f32 * size,
                voxel.z as f32 * size,
            ];

            let first = mesh.vertex_count() as u32;
            for corner in CUBE_CORNERS {
                let position = [0, 1, 2].map(|axis| base[axis] + corner[axis] * size);
                mesh.push_vertex(Vertex::new(position, color));
            }
            for quad in CUBE_QUADS {
                mesh.push_quad(quad.map(|corner| first + corner));
            }
        }

        mesh
    }
}
