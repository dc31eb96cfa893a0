//! `.vox` decoding.
//!
//! The container is a tree of length-prefixed chunks. The reader walks it
//! recursively and always resumes at the end of each chunk's declared range,
//! so chunk types it does not know are skipped without being interpreted.
//!
//! A [`Decoder`] runs in one of two profiles. [`Strictness::Strict`] turns
//! any structural problem into an error. [`Strictness::Lenient`] records it
//! as a [`Diagnostic`], abandons the damaged byte range and keeps every model
//! that was read completely before the damage.

use super::chunk::{le_i32, read_bytes, ChunkHeader, ChunkId, RGBA_CONTENT_LEN, SIZE_CONTENT_LEN};
use super::{MAGIC, VERSION};
use crate::error::{FormatError, Result, VoxError};
use crate::palette::{Palette, PALETTE_LEN};
use crate::types::{fitted_size, VoxFile, VoxModel, Voxel};
use log::{debug, warn};

/// How the decoder reacts to structural problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Structural problems are errors.
    #[default]
    Strict,
    /// Structural problems become diagnostics; decoding never fails.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The file's version stamp is not the one this codec targets.
    VersionMismatch,
    /// Structural damage that the lenient profile stepped over.
    Format,
}

/// A non-fatal problem found while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub offset: usize,
    pub message: String,
}

impl Diagnostic {
    fn from_format(err: &FormatError) -> Self {
        Self {
            kind: DiagnosticKind::Format,
            offset: err.offset(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::VersionMismatch => "version",
            DiagnosticKind::Format => "format",
        };
        write!(f, "[{} @ {}] {}", kind, self.offset, self.message)
    }
}

/// Outcome of a decode: the file, if one could be produced, and what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub file: Option<VoxFile>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Decoded {
    /// The first model block, if decoding produced a file.
    pub fn model(&self) -> Option<&VoxModel> {
        self.file.as_ref().and_then(|f| f.models.first())
    }

    pub fn into_model(self) -> Option<VoxModel> {
        self.file.and_then(VoxFile::into_first_model)
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Decoder configuration.
#[derive(Debug, Clone)]
pub struct Decoder {
    strictness: Strictness,
    expected_version: i32,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(Strictness::Strict)
    }
}

impl Decoder {
    pub fn new(strictness: Strictness) -> Self {
        Self {
            strictness,
            expected_version: VERSION,
        }
    }

    /// Version stamp that does not raise a mismatch diagnostic.
    pub fn with_expected_version(mut self, version: i32) -> Self {
        self.expected_version = version;
        self
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Decode a whole container, every model block included.
    ///
    /// In the lenient profile this never returns `Err`; failures show up as
    /// `file: None` plus diagnostics.
    pub fn decode_file(&self, data: &[u8]) -> Result<Decoded> {
        let mut session = Session::new(self.strictness);
        let file = self.read_container(data, &mut session)?;
        if let Some(file) = &file {
            debug!(
                "decoded {} model(s) from {} bytes, version {}",
                file.models.len(),
                data.len(),
                file.version
            );
        }
        Ok(Decoded {
            file,
            diagnostics: session.diagnostics,
        })
    }

    fn read_container(
        &self,
        data: &[u8],
        session: &mut Session,
    ) -> std::result::Result<Option<VoxFile>, FormatError> {
        let magic = &data[..data.len().min(MAGIC.len())];
        if magic != MAGIC {
            session.recover(FormatError::BadMagic {
                found: magic.to_vec(),
            })?;
            return Ok(None);
        }

        let version = match read_bytes(data, 4, 4, data.len()) {
            Ok(bytes) => le_i32(bytes, 0),
            Err(err) => {
                session.recover(err)?;
                return Ok(None);
            }
        };
        if version != self.expected_version {
            session.note(
                DiagnosticKind::VersionMismatch,
                4,
                format!(
                    "VOX version {} is untested (expected {}), continuing",
                    version, self.expected_version
                ),
            );
        }

        let main = match ChunkHeader::read(data, 8, data.len()) {
            Ok(header) => header,
            Err(err) => {
                session.recover(err)?;
                return Ok(None);
            }
        };
        if main.id != ChunkId::Main {
            session.recover(FormatError::MissingMain {
                found: main.id.to_string(),
            })?;
            return Ok(None);
        }
        // A short MAIN still has its complete children read in lenient mode.
        let main_end = match main.check_within(data.len()) {
            Ok(()) => main.children_end(),
            Err(err) => {
                session.recover(err)?;
                data.len()
            }
        };

        let mut state = WalkState::default();
        walk(data, main.content_end().min(main_end), main_end, 0, &mut state, session)?;
        Ok(state.finish(version, session.damaged))
    }
}

/// Models, palette and the pending `SIZE` collected during one walk.
#[derive(Default)]
struct WalkState {
    /// Most recent `SIZE` not yet paired with an `XYZI`.
    pending_size: Option<[u32; 3]>,
    models: Vec<([u32; 3], Vec<Voxel>)>,
    palette: Option<Palette>,
}

impl WalkState {
    fn finish(self, version: i32, damaged: bool) -> Option<VoxFile> {
        let WalkState {
            pending_size,
            mut models,
            palette,
        } = self;

        if models.is_empty() {
            if damaged {
                return None;
            }
            models.push((pending_size.unwrap_or_default(), Vec::new()));
        }

        let palette = palette.unwrap_or_default();
        let models = models
            .into_iter()
            .map(|(size, voxels)| VoxModel::new(size, voxels).with_palette(palette.clone()))
            .collect();
        Some(VoxFile { version, models })
    }
}

/// Per-call error policy and collected diagnostics.
struct Session {
    strictness: Strictness,
    diagnostics: Vec<Diagnostic>,
    damaged: bool,
}

impl Session {
    fn new(strictness: Strictness) -> Self {
        Self {
            strictness,
            diagnostics: Vec::new(),
            damaged: false,
        }
    }

    /// Strict: hand the error back. Lenient: record it and carry on.
    fn recover(&mut self, err: FormatError) -> std::result::Result<(), FormatError> {
        match self.strictness {
            Strictness::Strict => Err(err),
            Strictness::Lenient => {
                warn!("{}", err);
                self.diagnostics.push(Diagnostic::from_format(&err));
                self.damaged = true;
                Ok(())
            }
        }
    }

    fn note(&mut self, kind: DiagnosticKind, offset: usize, message: String) {
        warn!("{}", message);
        self.diagnostics.push(Diagnostic {
            kind,
            offset,
            message,
        });
    }
}

/// Deepest chunk nesting below `MAIN` that is walked.
const MAX_NESTING: usize = 64;

/// Walk the sibling chunks in `start..end`, `depth` levels below `MAIN`.
fn walk(
    data: &[u8],
    start: usize,
    end: usize,
    depth: usize,
    state: &mut WalkState,
    session: &mut Session,
) -> std::result::Result<(), FormatError> {
    let mut cursor = start;
    while cursor < end {
        let chunk = match ChunkHeader::parse(data, cursor, end) {
            Ok(chunk) => chunk,
            // Without a trustworthy length the rest of this range is lost.
            Err(err) => return session.recover(err),
        };

        if let Err(err) = read_chunk(data, &chunk, state) {
            session.recover(err)?;
        } else if chunk.id.is_recognized() && chunk.children_len > 0 {
            if depth >= MAX_NESTING {
                // Children are skipped along with the chunk.
                session.recover(FormatError::MalformedChunk {
                    id: chunk.id.to_string(),
                    offset: chunk.offset,
                    reason: "chunk nesting too deep".to_string(),
                })?;
            } else {
                walk(data, chunk.content_end(), chunk.children_end(), depth + 1, state, session)?;
            }
        }

        cursor = chunk.children_end();
    }
    Ok(())
}

fn read_chunk(
    data: &[u8],
    chunk: &ChunkHeader,
    state: &mut WalkState,
) -> std::result::Result<(), FormatError> {
    let content = chunk.content(data);
    let malformed = |reason: String| FormatError::MalformedChunk {
        id: chunk.id.to_string(),
        offset: chunk.offset,
        reason,
    };

    match chunk.id {
        ChunkId::Size => {
            if content.len() < SIZE_CONTENT_LEN {
                return Err(malformed(format!(
                    "content is {} bytes, expected {}",
                    content.len(),
                    SIZE_CONTENT_LEN
                )));
            }
            let mut size = [0u32; 3];
            for (axis, slot) in size.iter_mut().enumerate() {
                let value = le_i32(content, axis * 4);
                *slot = u32::try_from(value)
                    .map_err(|_| malformed(format!("negative dimension {}", value)))?;
            }
            state.pending_size = Some(size);
        }
        ChunkId::Xyzi => {
            if content.len() < 4 {
                return Err(malformed("missing voxel count".to_string()));
            }
            let count = le_i32(content, 0);
            let count = usize::try_from(count)
                .map_err(|_| malformed(format!("negative voxel count {}", count)))?;
            let records = &content[4..];
            if count > records.len() / 4 {
                return Err(malformed(format!(
                    "{} voxels need {} bytes, chunk holds {}",
                    count,
                    count as u64 * 4,
                    records.len()
                )));
            }

            let voxels: Vec<Voxel> = records[..count * 4]
                .chunks_exact(4)
                .map(|r| Voxel::new(r[0], r[1], r[2], r[3]))
                .collect();
            let size = state
                .pending_size
                .take()
                .unwrap_or_else(|| fitted_size(&voxels));
            state.models.push((size, voxels));
        }
        ChunkId::Rgba => {
            if content.len() < RGBA_CONTENT_LEN {
                return Err(malformed(format!(
                    "content is {} bytes, expected {}",
                    content.len(),
                    RGBA_CONTENT_LEN
                )));
            }
            let mut table = [0u32; PALETTE_LEN];
            for (slot, bytes) in table.iter_mut().zip(content.chunks_exact(4)) {
                *slot = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            state.palette = Some(Palette::from_array(table));
        }
        ChunkId::Main => {
            debug!("nested MAIN chunk at offset {}", chunk.offset);
        }
        ChunkId::Other(_) => {
            debug!(
                "skipping {} chunk at offset {} ({} bytes)",
                chunk.id,
                chunk.offset,
                chunk.children_end() - chunk.offset
            );
        }
    }
    Ok(())
}

/// Decode the first model block, strictly.
pub fn decode(data: &[u8]) -> Result<VoxModel> {
    Ok(decode_file(data)?.into_first_model().unwrap_or_default())
}

/// Decode every model block, strictly.
pub fn decode_file(data: &[u8]) -> Result<VoxFile> {
    let decoded = Decoder::new(Strictness::Strict).decode_file(data)?;
    Ok(decoded.file.unwrap_or(VoxFile {
        version: VERSION,
        models: Vec::new(),
    }))
}

/// Decode without ever failing: damage becomes diagnostics.
pub fn decode_lenient(data: &[u8]) -> Decoded {
    match Decoder::new(Strictness::Lenient).decode_file(data) {
        Ok(decoded) => decoded,
        Err(err) => Decoded {
            file: None,
            diagnostics: vec![match &err {
                VoxError::Format(format) => Diagnostic::from_format(format),
                other => Diagnostic {
                    kind: DiagnosticKind::Format,
                    offset: 0,
                    message: other.to_string(),
                },
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vox::encode;

    fn chunk(id: &[u8; 4], content: &[u8], children: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(id);
        out.extend_from_slice(&(content.len() as i32).to_le_bytes());
        out.extend_from_slice(&(children.len() as i32).to_le_bytes());
        out.extend_from_slice(content);
        out.extend_from_slice(children);
        out
    }

    fn size_chunk(x: i32, y: i32, z: i32) -> Vec<u8> {
        let mut content = Vec::new();
        for v in [x, y, z] {
            content.extend_from_slice(&v.to_le_bytes());
        }
        chunk(b"SIZE", &content, &[])
    }

    fn xyzi_chunk(voxels: &[[u8; 4]]) -> Vec<u8> {
        let mut content = (voxels.len() as i32).to_le_bytes().to_vec();
        for v in voxels {
            content.extend_from_slice(v);
        }
        chunk(b"XYZI", &content, &[])
    }

    fn container(version: i32, children: &[Vec<u8>]) -> Vec<u8> {
        let mut out = b"VOX ".to_vec();
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&chunk(b"MAIN", &[], &children.concat()));
        out
    }

    /// `depth` nested MAIN headers wrapped around `inner`, built without
    /// re-copying each level.
    fn nested_mains(depth: usize, inner: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(depth * 12 + inner.len());
        for level in 0..depth {
            let children = (depth - 1 - level) * 12 + inner.len();
            out.extend_from_slice(b"MAIN");
            out.extend_from_slice(&0i32.to_le_bytes());
            out.extend_from_slice(&(children as i32).to_le_bytes());
        }
        out.extend_from_slice(inner);
        out
    }

    fn cube_voxels() -> Vec<[u8; 4]> {
        let mut voxels = Vec::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    voxels.push([x, y, z, 1]);
                }
            }
        }
        voxels
    }

    #[test]
    fn test_decode_filled_cube() {
        let data = container(150, &[size_chunk(2, 2, 2), xyzi_chunk(&cube_voxels())]);
        let model = decode(&data).unwrap();

        assert_eq!(model.dimensions(), [2, 2, 2]);
        assert_eq!(model.voxels.len(), 8);
        assert_eq!(model.voxels[7], Voxel::new(1, 1, 1, 1));
        assert_eq!(model.palette, Palette::default());
    }

    #[test]
    fn test_decode_without_size_fits_voxels() {
        let data = container(150, &[xyzi_chunk(&[[4, 0, 2, 3], [1, 6, 0, 3]])]);
        let model = decode(&data).unwrap();
        assert_eq!(model.dimensions(), [5, 7, 3]);
    }

    #[test]
    fn test_decode_multiple_models() {
        let data = container(
            150,
            &[
                size_chunk(3, 3, 3),
                xyzi_chunk(&[[0, 0, 0, 1]]),
                xyzi_chunk(&[[9, 1, 1, 2]]),
                size_chunk(4, 5, 6),
                xyzi_chunk(&[[1, 1, 1, 3], [2, 2, 2, 3]]),
            ],
        );
        let file = decode_file(&data).unwrap();

        assert_eq!(file.version, 150);
        assert_eq!(file.models.len(), 3);
        assert_eq!(file.models[0].dimensions(), [3, 3, 3]);
        // The first SIZE was consumed, so the second block is fitted.
        assert_eq!(file.models[1].dimensions(), [10, 2, 2]);
        assert_eq!(file.models[2].dimensions(), [4, 5, 6]);
        assert_eq!(file.models[2].voxel_count(), 2);
    }

    #[test]
    fn test_rgba_applies_to_every_model() {
        let mut rgba = Vec::new();
        for i in 0..256u32 {
            rgba.extend_from_slice(&(0xff00_0000 | i).to_le_bytes());
        }
        let data = container(
            150,
            &[
                chunk(b"RGBA", &rgba, &[]),
                xyzi_chunk(&[[0, 0, 0, 1]]),
                xyzi_chunk(&[[1, 0, 0, 2]]),
            ],
        );
        let file = decode_file(&data).unwrap();
        for model in &file.models {
            assert_eq!(model.palette.slot(5), 0xff00_0005);
        }
    }

    #[test]
    fn test_unknown_chunks_are_skipped() {
        let base = vec![size_chunk(2, 2, 2), xyzi_chunk(&cube_voxels())];
        let expected = decode(&container(150, &base)).unwrap();

        let unknown = chunk(b"nTRN", &[1, 2, 3, 4, 5], &[]);
        // Children of an unknown chunk are never looked at, even if they are garbage.
        let unknown_with_children = chunk(b"nGRP", &[0; 8], &[0xde, 0xad, 0xbe, 0xef, 0x00]);

        for position in 0..=base.len() {
            for extra in [&unknown, &unknown_with_children] {
                let mut children = base.clone();
                children.insert(position, extra.clone());
                let model = decode(&container(150, &children)).unwrap();
                assert_eq!(model, expected, "unknown chunk at position {}", position);
            }
        }
    }

    #[test]
    fn test_recognized_children_are_walked() {
        let nested = chunk(b"SIZE", &size_chunk(7, 7, 7)[12..], &xyzi_chunk(&[[1, 2, 3, 4]]));
        let model = decode(&container(150, &[nested])).unwrap();
        assert_eq!(model.dimensions(), [7, 7, 7]);
        assert_eq!(model.voxels, vec![Voxel::new(1, 2, 3, 4)]);
    }

    #[test]
    fn test_empty_main_gives_empty_model() {
        let model = decode(&container(150, &[size_chunk(8, 9, 10)])).unwrap();
        assert_eq!(model.dimensions(), [8, 9, 10]);
        assert!(model.is_empty());

        let model = decode(&container(150, &[])).unwrap();
        assert_eq!(model.dimensions(), [0, 0, 0]);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = container(150, &[xyzi_chunk(&[[0, 0, 0, 1]])]);
        data[0..4].copy_from_slice(b"VOXX");

        let err = decode(&data).unwrap_err();
        assert!(matches!(err, VoxError::Format(FormatError::BadMagic { .. })));

        let decoded = decode_lenient(&data);
        assert!(decoded.file.is_none());
        assert_eq!(decoded.diagnostics.len(), 1);
        assert_eq!(decoded.diagnostics[0].kind, DiagnosticKind::Format);
    }

    #[test]
    fn test_missing_main() {
        let mut data = b"VOX ".to_vec();
        data.extend_from_slice(&150i32.to_le_bytes());
        data.extend_from_slice(&xyzi_chunk(&[[0, 0, 0, 1]]));

        let err = decode(&data).unwrap_err();
        assert!(matches!(err, VoxError::Format(FormatError::MissingMain { .. })));
        assert!(decode_lenient(&data).file.is_none());
    }

    #[test]
    fn test_version_mismatch_is_a_warning() {
        let data = container(200, &[size_chunk(1, 1, 1), xyzi_chunk(&[[0, 0, 0, 1]])]);

        let decoded = Decoder::new(Strictness::Strict).decode_file(&data).unwrap();
        assert_eq!(decoded.diagnostics.len(), 1);
        assert_eq!(decoded.diagnostics[0].kind, DiagnosticKind::VersionMismatch);
        assert_eq!(decoded.model().unwrap().voxel_count(), 1);

        let decoded = Decoder::default()
            .with_expected_version(200)
            .decode_file(&data)
            .unwrap();
        assert!(!decoded.has_diagnostics());
    }

    #[test]
    fn test_truncated_voxel_list() {
        let mut xyzi = xyzi_chunk(&cube_voxels());
        // Claim more voxels than the content holds.
        xyzi[12..16].copy_from_slice(&9i32.to_le_bytes());
        let data = container(150, &[size_chunk(2, 2, 2), xyzi]);

        let err = decode(&data).unwrap_err();
        assert!(matches!(err, VoxError::Format(FormatError::MalformedChunk { .. })));

        let decoded = decode_lenient(&data);
        assert!(decoded.file.is_none());
        assert!(decoded.has_diagnostics());
    }

    #[test]
    fn test_lenient_keeps_complete_models_before_damage() {
        let mut data = container(
            150,
            &[
                size_chunk(2, 2, 2),
                xyzi_chunk(&cube_voxels()),
                size_chunk(1, 1, 1),
                xyzi_chunk(&[[0, 0, 0, 5]]),
            ],
        );
        // Cut into the second XYZI chunk.
        data.truncate(data.len() - 2);

        assert!(decode(&data).is_err());

        let decoded = decode_lenient(&data);
        let file = decoded.file.unwrap();
        assert_eq!(file.models.len(), 1);
        assert_eq!(file.models[0].voxel_count(), 8);
        assert!(!decoded.diagnostics.is_empty());
    }

    #[test]
    fn test_lenient_never_fails_on_truncation() {
        let model = VoxModel::fitted(cube_voxels().iter().map(|v| Voxel::new(v[0], v[1], v[2], v[3])).collect());
        let data = encode(&model).unwrap();

        for len in 0..data.len() {
            let decoded = decode_lenient(&data[..len]);
            if let Some(file) = decoded.file {
                for m in &file.models {
                    assert!(m.voxel_count() == 0 || m.voxel_count() == 8);
                }
            }
        }
    }

    #[test]
    fn test_lenient_never_fails_on_corruption() {
        let model = VoxModel::fitted(vec![Voxel::new(1, 2, 3, 4), Voxel::new(0, 0, 0, 1)]);
        let data = encode(&model).unwrap();

        for i in 0..data.len() {
            for byte in [0x00, 0x7f, 0xff] {
                let mut corrupted = data.clone();
                corrupted[i] = byte;
                let _ = decode_lenient(&corrupted);
                let _ = decode(&corrupted);
            }
        }
    }

    #[test]
    fn test_negative_size_is_malformed() {
        let data = container(150, &[size_chunk(-1, 2, 2), xyzi_chunk(&[[0, 0, 0, 1]])]);
        assert!(decode(&data).is_err());

        // The bad SIZE is skipped; the voxels are still read and fitted.
        let decoded = decode_lenient(&data);
        let model = decoded.into_model().unwrap();
        assert_eq!(model.dimensions(), [1, 1, 1]);
    }

    #[test]
    fn test_moderate_nesting_is_walked() {
        let inner = [size_chunk(2, 2, 2), xyzi_chunk(&cube_voxels())].concat();
        let data = container(150, &[nested_mains(10, &inner)]);

        let model = decode(&data).unwrap();
        assert_eq!(model.dimensions(), [2, 2, 2]);
        assert_eq!(model.voxel_count(), 8);
    }

    #[test]
    fn test_deep_nesting_is_rejected_without_overflow() {
        let inner = xyzi_chunk(&cube_voxels());
        let data = container(150, &[nested_mains(100_000, &inner)]);

        let err = decode(&data).unwrap_err();
        assert!(matches!(
            err,
            VoxError::Format(FormatError::MalformedChunk { ref reason, .. }) if reason.contains("nesting")
        ));

        let decoded = decode_lenient(&data);
        assert!(decoded.file.is_none());
        assert!(decoded
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Format && d.message.contains("nesting")));
    }

    #[test]
    fn test_deep_nesting_keeps_earlier_models_in_lenient_mode() {
        let deep = nested_mains(MAX_NESTING + 5, &xyzi_chunk(&[[0, 0, 0, 1]]));
        let data = container(150, &[size_chunk(2, 2, 2), xyzi_chunk(&cube_voxels()), deep]);

        let decoded = decode_lenient(&data);
        assert!(decoded.has_diagnostics());
        let file = decoded.file.unwrap();
        assert_eq!(file.models.len(), 1);
        assert_eq!(file.models[0].voxel_count(), 8);
    }
}
