//! Bounding-box voxelization.
//!
//! Each triangle marks every grid cell inside its own axis-aligned bounding
//! box. This over-fills thin and diagonal triangles; it is not an exact
//! triangle/cell intersection test.

use crate::error::GeometryError;
use crate::import::obj::ObjMesh;
use crate::palette::Palette;
use crate::types::{VoxModel, Voxel};
use glam::{DVec3, IVec3};
use log::debug;
use std::collections::HashSet;

/// Largest grid extent that fits byte coordinates.
const MAX_EXTENT: u64 = 256;

/// Options for turning a mesh into voxels.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Edge length of one voxel in mesh units.
    pub voxel_size: f64,
    /// Color index given to every produced voxel.
    pub color_index: u8,
    /// Palette attached to the produced model.
    pub palette: Palette,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            voxel_size: 1.0,
            color_index: 1,
            palette: Palette::default(),
        }
    }
}

impl ImportOptions {
    pub fn with_voxel_size(mut self, voxel_size: f64) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    pub fn with_color_index(mut self, color_index: u8) -> Self {
        self.color_index = color_index;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }
}

/// Rasterize a parsed mesh into a voxel model.
pub fn voxelize(mesh: &ObjMesh, options: &ImportOptions) -> Result<VoxModel, GeometryError> {
    let voxel_size = options.voxel_size;
    if !(voxel_size.is_finite() && voxel_size > 0.0) {
        return Err(GeometryError::InvalidVoxelSize(voxel_size));
    }
    if mesh.vertices.is_empty() {
        return Err(GeometryError::NoVertices);
    }
    if mesh.faces.is_empty() {
        return Err(GeometryError::NoFaces);
    }

    // Bounds over the vertices the faces actually use.
    let (min, max) = mesh
        .faces
        .iter()
        .flat_map(|face| mesh.triangle(*face))
        .fold((DVec3::INFINITY, DVec3::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        });

    let extent = ((max - min) / voxel_size).ceil() + DVec3::ONE;
    let mut size = [0u32; 3];
    for (axis, name) in ['x', 'y', 'z'].into_iter().enumerate() {
        let cells = extent[axis] as u64;
        if cells > MAX_EXTENT {
            return Err(GeometryError::TooLarge { axis: name, extent: cells });
        }
        size[axis] = cells as u32;
    }

    let to_grid = |p: DVec3| ((p - min) / voxel_size).floor().as_ivec3();

    let mut occupied: HashSet<IVec3> = HashSet::new();
    let mut voxels = Vec::new();
    for face in &mesh.faces {
        let [a, b, c] = mesh.triangle(*face).map(to_grid);
        let lo = a.min(b).min(c);
        let hi = a.max(b).max(c);

        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    let cell = IVec3::new(x, y, z);
                    if occupied.insert(cell) {
                        voxels.push(Voxel::new(x as u8, y as u8, z as u8, options.color_index));
                    }
                }
            }
        }
    }

    debug!(
        "voxelized {} faces into {} voxels ({}x{}x{})",
        mesh.faces.len(),
        voxels.len(),
        size[0],
        size[1],
        size[2]
    );

    Ok(VoxModel::new(size, voxels).with_palette(options.palette.clone()))
}
