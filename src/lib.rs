//! # Voxel Shaper
//!
//! Read, write and convert MagicaVoxel `.vox` models.
//!
//! ## Overview
//!
//! - [`vox`] decodes and encodes the chunked `.vox` container, with a strict
//!   profile that rejects damaged input and a lenient one that recovers what
//!   it can and reports diagnostics.
//! - [`export`] turns a model into per-voxel cube meshes (OBJ text or GLB).
//! - [`import`] voxelizes OBJ triangle meshes with a bounding-box rasterizer.
//! - [`palette`] holds the 256-entry color table and its defaults.
//!
//! ## Quick Start
//!
//! ```ignore
//! use voxel_shaper::{decode, encode, export_obj, import_obj};
//!
//! let model = decode(&std::fs::read("castle.vox")?)?;
//! let obj = export_obj(&model, 1.0);
//!
//! let back = import_obj(&obj, 1.0)?;
//! std::fs::write("castle_blocky.vox", encode(&back)?)?;
//! ```
//!
//! Damaged files can be read with [`decode_lenient`]:
//!
//! ```ignore
//! let decoded = voxel_shaper::decode_lenient(&bytes);
//! for diagnostic in &decoded.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! if let Some(model) = decoded.into_model() {
//!     // ...
//! }
//! ```

pub mod error;
pub mod types;
pub mod palette;
pub mod vox;
pub mod mesher;
pub mod export;
pub mod import;

// Re-export main types for convenience
pub use error::{FormatError, GeometryError, Result, VoxError};
pub use types::{VoxFile, VoxModel, Voxel, VoxelBounds};
pub use palette::{index_to_color, Palette, Rgba, ZeroIndex, REFERENCE_PALETTE};
pub use vox::{
    decode, decode_file, decode_lenient, encode, load_vox, save_vox, write_vox, Decoded, Decoder,
    Diagnostic, DiagnosticKind, Strictness,
};
pub use mesher::{CubeMesher, ExportOptions, Mesh, Vertex};
pub use export::{export_glb, export_obj, export_obj_with};
pub use import::{import_obj, import_obj_with, ImportOptions, ObjMesh};

#[cfg(feature = "wasm")]
pub mod wasm;
