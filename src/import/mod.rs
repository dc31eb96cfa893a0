//! Mesh import: OBJ text to voxels.

pub mod obj;
pub mod voxelize;

pub use obj::ObjMesh;
pub use voxelize::{voxelize, ImportOptions};

use crate::error::Result;
use crate::types::VoxModel;

/// Voxelize OBJ text with the given voxel size and default options.
pub fn import_obj(text: &str, voxel_size: f64) -> Result<VoxModel> {
    import_obj_with(text, &ImportOptions::default().with_voxel_size(voxel_size))
}

/// Voxelize OBJ text.
pub fn import_obj_with(text: &str, options: &ImportOptions) -> Result<VoxModel> {
    let mesh = ObjMesh::parse(text)?;
    Ok(voxelize(&mesh, options)?)
}
