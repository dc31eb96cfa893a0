//! Mesh export formats.

pub mod gltf;
pub mod obj;

pub use gltf::{export_glb, write_glb};
pub use obj::{export_obj, export_obj_with, write_obj};
