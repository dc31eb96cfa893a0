//! Chunk ids and the 12-byte chunk header.

use crate::error::FormatError;
use std::fmt;

/// Size of a chunk header: id plus two little-endian `i32` lengths.
pub const CHUNK_HEADER_LEN: usize = 12;

/// Size in bytes of each chunk's content as written by the encoder.
pub const SIZE_CONTENT_LEN: usize = 12;
pub const RGBA_CONTENT_LEN: usize = 256 * 4;

/// The chunk kinds the codec understands. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkId {
    Main,
    Size,
    Xyzi,
    Rgba,
    Other([u8; 4]),
}

impl ChunkId {
    pub fn from_bytes(id: [u8; 4]) -> Self {
        match &id {
            b"MAIN" => ChunkId::Main,
            b"SIZE" => ChunkId::Size,
            b"XYZI" => ChunkId::Xyzi,
            b"RGBA" => ChunkId::Rgba,
            _ => ChunkId::Other(id),
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        match self {
            ChunkId::Main => *b"MAIN",
            ChunkId::Size => *b"SIZE",
            ChunkId::Xyzi => *b"XYZI",
            ChunkId::Rgba => *b"RGBA",
            ChunkId::Other(id) => id,
        }
    }

    /// Whether the reader walks into this chunk's children.
    pub fn is_recognized(self) -> bool {
        !matches!(self, ChunkId::Other(_))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            // Checked ASCII above.
            f.write_str(std::str::from_utf8(&bytes).unwrap_or("????"))
        } else {
            write!(f, "{:02x?}", bytes)
        }
    }
}

/// A decoded chunk header with the absolute offsets it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: ChunkId,
    /// Offset of the header's first byte.
    pub offset: usize,
    pub content_len: usize,
    pub children_len: usize,
}

impl ChunkHeader {
    /// Parse a header at `offset`, requiring the whole chunk to end by `limit`.
    pub fn parse(data: &[u8], offset: usize, limit: usize) -> Result<Self, FormatError> {
        let limit = limit.min(data.len());
        let chunk = Self::read(data, offset, limit)?;
        chunk.check_within(limit)?;
        Ok(chunk)
    }

    /// Read the 12 header bytes at `offset` without checking the declared lengths
    /// against the available data.
    pub fn read(data: &[u8], offset: usize, limit: usize) -> Result<Self, FormatError> {
        let header = read_bytes(data, offset, CHUNK_HEADER_LEN, limit)?;
        let id = ChunkId::from_bytes([header[0], header[1], header[2], header[3]]);
        let content = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let children = i32::from_le_bytes([header[8], header[9], header[10], header[11]]);

        let malformed = |reason: String| FormatError::MalformedChunk {
            id: id.to_string(),
            offset,
            reason,
        };
        if content < 0 {
            return Err(malformed(format!("negative content size {}", content)));
        }
        if children < 0 {
            return Err(malformed(format!("negative children size {}", children)));
        }

        Ok(Self {
            id,
            offset,
            content_len: content as usize,
            children_len: children as usize,
        })
    }

    /// Check that content and children end by `limit`.
    pub fn check_within(&self, limit: usize) -> Result<(), FormatError> {
        let available = limit.saturating_sub(self.content_start());
        let needed = self.content_len + self.children_len;
        if needed > available {
            return Err(FormatError::Truncated {
                offset: self.content_start(),
                needed,
                available,
            });
        }
        Ok(())
    }

    pub fn content_start(&self) -> usize {
        self.offset + CHUNK_HEADER_LEN
    }

    pub fn content_end(&self) -> usize {
        self.content_start() + self.content_len
    }

    /// End of the chunk including children: where the next sibling starts.
    pub fn children_end(&self) -> usize {
        self.content_end() + self.children_len
    }

    /// The chunk's content bytes.
    pub fn content<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.content_start()..self.content_end()]
    }
}

/// Write a chunk header.
pub fn write_header(out: &mut Vec<u8>, id: ChunkId, content_len: i32, children_len: i32) {
    out.extend_from_slice(&id.to_bytes());
    out.extend_from_slice(&content_len.to_le_bytes());
    out.extend_from_slice(&children_len.to_le_bytes());
}

/// Borrow `len` bytes at `offset`, failing if they cross `limit` or the buffer end.
pub fn read_bytes(data: &[u8], offset: usize, len: usize, limit: usize) -> Result<&[u8], FormatError> {
    let end = limit.min(data.len());
    let available = end.saturating_sub(offset);
    if len > available {
        return Err(FormatError::Truncated {
            offset,
            needed: len,
            available,
        });
    }
    Ok(&data[offset..offset + len])
}

/// Read a little-endian `i32` at `offset` within `bytes`. Caller checks bounds.
pub fn le_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
