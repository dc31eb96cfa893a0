//! MagicaVoxel `.vox` container codec.
//!
//! Layout: a 4-byte magic (`"VOX "`), a little-endian `i32` version, then a
//! `MAIN` chunk whose children hold the model data. See [`chunk`] for the
//! chunk header format.

pub mod chunk;
pub mod reader;
pub mod writer;

pub use chunk::{ChunkHeader, ChunkId};
pub use reader::{
    decode, decode_file, decode_lenient, Decoded, Decoder, Diagnostic, DiagnosticKind, Strictness,
};
pub use writer::{encode, write_vox};

use crate::error::Result;
use crate::types::VoxModel;
use std::path::Path;

/// File magic.
pub const MAGIC: &[u8; 4] = b"VOX ";

/// The container version this codec writes and expects.
pub const VERSION: i32 = 150;

/// Read and strictly decode the first model of a `.vox` file.
pub fn load_vox<P: AsRef<Path>>(path: P) -> Result<VoxModel> {
    let data = std::fs::read(path)?;
    decode(&data)
}

/// Encode a model and write it to a `.vox` file.
pub fn save_vox<P: AsRef<Path>>(path: P, model: &VoxModel) -> Result<()> {
    std::fs::write(path, encode(model)?)?;
    Ok(())
}
