//! `.vox` encoding.
//!
//! The writer always emits the same single-model layout:
//!
//! ```text
//! "VOX " version
//! MAIN (content 0, children = everything below)
//!   SIZE (12 bytes)
//!   XYZI (4 + 4 * voxel count bytes)
//!   RGBA (1024 bytes)
//! ```

use super::chunk::{write_header, ChunkId, CHUNK_HEADER_LEN, RGBA_CONTENT_LEN, SIZE_CONTENT_LEN};
use super::{MAGIC, VERSION};
use crate::error::{Result, VoxError};
use crate::types::VoxModel;
use std::io::Write;

/// Byte lengths of the chunks written for one model.
struct Layout {
    xyzi_content: i32,
    main_children: i32,
}

impl Layout {
    fn of(model: &VoxModel) -> Result<Self> {
        let too_large = || {
            VoxError::Encode(format!(
                "{} voxels do not fit in an XYZI chunk",
                model.voxels.len()
            ))
        };

        let xyzi_content = model
            .voxels
            .len()
            .checked_mul(4)
            .and_then(|n| n.checked_add(4))
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(too_large)?;

        let main_children = [
            CHUNK_HEADER_LEN + SIZE_CONTENT_LEN,
            CHUNK_HEADER_LEN + RGBA_CONTENT_LEN,
            CHUNK_HEADER_LEN,
        ]
        .iter()
        .try_fold(xyzi_content, |acc, len| acc.checked_add(*len as i32))
        .ok_or_else(too_large)?;

        Ok(Self {
            xyzi_content,
            main_children,
        })
    }

    fn total_len(&self) -> usize {
        MAGIC.len() + 4 + CHUNK_HEADER_LEN + self.main_children as usize
    }
}

/// Encode a model as a complete `.vox` container.
pub fn encode(model: &VoxModel) -> Result<Vec<u8>> {
    let layout = Layout::of(model)?;
    let mut size = [0i32; 3];
    for (slot, dim) in size.iter_mut().zip(model.dimensions()) {
        *slot = i32::try_from(dim)
            .map_err(|_| VoxError::Encode(format!("dimension {} does not fit in an i32", dim)))?;
    }

    let mut out = Vec::with_capacity(layout.total_len());

    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());

    write_header(&mut out, ChunkId::Main, 0, layout.main_children);

    write_header(&mut out, ChunkId::Size, SIZE_CONTENT_LEN as i32, 0);
    for dim in size {
        out.extend_from_slice(&dim.to_le_bytes());
    }

    write_header(&mut out, ChunkId::Xyzi, layout.xyzi_content, 0);
    out.extend_from_slice(&(model.voxels.len() as i32).to_le_bytes());
    for v in &model.voxels {
        out.extend_from_slice(&[v.x, v.y, v.z, v.color_index]);
    }

    write_header(&mut out, ChunkId::Rgba, RGBA_CONTENT_LEN as i32, 0);
    for color in model.palette.iter() {
        out.extend_from_slice(&color.to_le_bytes());
    }

    debug_assert_eq!(out.len(), layout.total_len());
    Ok(out)
}

/// Encode a model and write it to `w`.
pub fn write_vox<W: Write>(mut w: W, model: &VoxModel) -> Result<()> {
    let bytes = encode(model)?;
    w.write_all(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::types::Voxel;
    use crate::vox::decode;

    fn read_i32(data: &[u8], offset: usize) -> i32 {
        i32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_encode_layout() {
        let model = VoxModel::new([3, 4, 5], vec![Voxel::new(0, 1, 2, 7), Voxel::new(2, 3, 4, 8)]);
        let data = encode(&model).unwrap();

        assert_eq!(data.len(), 8 + 12 + 24 + (12 + 4 + 8) + (12 + 1024));
        assert_eq!(&data[0..4], b"VOX ");
        assert_eq!(read_i32(&data, 4), 150);

        assert_eq!(&data[8..12], b"MAIN");
        assert_eq!(read_i32(&data, 12), 0);
        assert_eq!(read_i32(&data, 16) as usize, data.len() - 20);

        assert_eq!(&data[20..24], b"SIZE");
        assert_eq!(read_i32(&data, 24), 12);
        assert_eq!(read_i32(&data, 28), 0);
        assert_eq!([read_i32(&data, 32), read_i32(&data, 36), read_i32(&data, 40)], [3, 4, 5]);

        assert_eq!(&data[44..48], b"XYZI");
        assert_eq!(read_i32(&data, 48), 4 + 8);
        assert_eq!(read_i32(&data, 56), 2);
        assert_eq!(&data[60..68], &[0, 1, 2, 7, 2, 3, 4, 8]);

        assert_eq!(&data[68..72], b"RGBA");
        assert_eq!(read_i32(&data, 72), 1024);
        assert_eq!(read_i32(&data, 76), 0);
        assert_eq!(
            u32::from_le_bytes(data[80..84].try_into().unwrap()),
            model.palette.slot(0)
        );
    }

    #[test]
    fn test_round_trip_single_voxel() {
        let model = VoxModel::new([1, 1, 1], vec![Voxel::new(0, 0, 0, 1)]);
        let back = decode(&encode(&model).unwrap()).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_round_trip_keeps_order_duplicates_and_palette() {
        let mut voxels = Vec::new();
        for i in 0..600u32 {
            voxels.push(Voxel::new((i % 256) as u8, (i / 3 % 256) as u8, (i * 7 % 256) as u8, (i % 255 + 1) as u8));
        }
        voxels.push(voxels[0]);
        voxels.push(Voxel::new(0, 0, 0, 0));

        let model = VoxModel::new([256, 256, 256], voxels).with_palette(Palette::grey_ramp());
        let back = decode(&encode(&model).unwrap()).unwrap();

        assert_eq!(back.dimensions(), model.dimensions());
        assert_eq!(back.voxels, model.voxels);
        assert_eq!(back.palette, model.palette);
    }

    #[test]
    fn test_round_trip_empty_model() {
        let model = VoxModel::new([4, 4, 4], Vec::new());
        let back = decode(&encode(&model).unwrap()).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_oversized_dimension_rejected() {
        let model = VoxModel::new([u32::MAX, 1, 1], Vec::new());
        assert!(matches!(encode(&model), Err(VoxError::Encode(_))));
    }

    #[test]
    fn test_write_vox_matches_encode() {
        let model = VoxModel::fitted(vec![Voxel::new(1, 1, 1, 2)]);
        let mut out = Vec::new();
        write_vox(&mut out, &model).unwrap();
        assert_eq!(out, encode(&model).unwrap());
    }
}
