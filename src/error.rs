//! Error types for the voxel codec.

use thiserror::Error;

/// Result type alias using VoxError.
pub type Result<T> = std::result::Result<T, VoxError>;

/// Main error type for decoding, encoding and converting voxel models.
#[derive(Error, Debug)]
pub enum VoxError {
    /// The binary container is structurally invalid.
    #[error("VOX format error: {0}")]
    Format(#[from] FormatError),

    /// Mesh text could not be turned into voxels.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A palette did not have exactly 256 entries.
    #[error("Palette must have exactly 256 entries, got {0}")]
    PaletteLength(usize),

    /// A model cannot be represented in the binary container.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Failed to export a mesh.
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or write JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or write a palette image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Structural problems in a `.vox` container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The first four bytes are not `"VOX "`.
    #[error("invalid magic header {found:?}, expected \"VOX \"")]
    BadMagic { found: Vec<u8> },

    /// The first chunk after the file header is not `MAIN`.
    #[error("missing MAIN chunk, found {found:?}")]
    MissingMain { found: String },

    /// A read ran past the end of the buffer or of the enclosing chunk.
    #[error("truncated data at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A chunk declared sizes or counts that cannot be right.
    #[error("malformed {id} chunk at offset {offset}: {reason}")]
    MalformedChunk {
        id: String,
        offset: usize,
        reason: String,
    },
}

/// Problems turning mesh text into a voxel model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The text contained no vertex records.
    #[error("mesh contains no vertices")]
    NoVertices,

    /// The text contained no face with three valid vertex references.
    #[error("mesh contains no usable faces")]
    NoFaces,

    /// A vertex record had fewer than three numeric coordinates.
    #[error("invalid vertex on line {line}: {text:?}")]
    InvalidVertex { line: usize, text: String },

    /// The voxel size was zero, negative or not finite.
    #[error("voxel size must be a positive finite number, got {0}")]
    InvalidVoxelSize(f64),

    /// The voxel grid would not fit byte-sized coordinates.
    #[error("mesh spans {extent} voxels along {axis}, at most 256 fit in a model")]
    TooLarge { axis: char, extent: u64 },
}

impl FormatError {
    /// Byte offset in the container where the problem was found.
    pub fn offset(&self) -> usize {
        match self {
            FormatError::BadMagic { .. } => 0,
            FormatError::MissingMain { .. } => 8,
            FormatError::Truncated { offset, .. } => *offset,
            FormatError::MalformedChunk { offset, .. } => *offset,
        }
    }
}
