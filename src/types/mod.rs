//! The voxel model value type shared by the codec, exporter and importer.

use crate::palette::Palette;
use serde::{Deserialize, Serialize};

/// A single voxel: byte grid coordinates and a 1-based palette color index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voxel {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub color_index: u8,
}

impl Voxel {
    pub const fn new(x: u8, y: u8, z: u8, color_index: u8) -> Self {
        Self { x, y, z, color_index }
    }

    pub fn position(&self) -> [u8; 3] {
        [self.x, self.y, self.z]
    }
}

/// A sparse voxel model: a bounding size, an ordered voxel list and a palette.
///
/// The voxel list is append-only and may repeat a coordinate; later entries
/// win for consumers that care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxModel {
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
    pub voxels: Vec<Voxel>,
    #[serde(default)]
    pub palette: Palette,
}

impl VoxModel {
    /// Create a model using the default palette.
    pub fn new(size: [u32; 3], voxels: Vec<Voxel>) -> Self {
        Self {
            size_x: size[0],
            size_y: size[1],
            size_z: size[2],
            voxels,
            palette: Palette::default(),
        }
    }

    /// Create a model sized to fit its voxels exactly (`max + 1` per axis).
    pub fn fitted(voxels: Vec<Voxel>) -> Self {
        let size = fitted_size(&voxels);
        Self::new(size, voxels)
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn dimensions(&self) -> [u32; 3] {
        [self.size_x, self.size_y, self.size_z]
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Cells actually occupied, which may be smaller than the declared size.
    pub fn bounds(&self) -> Option<VoxelBounds> {
        VoxelBounds::of(&self.voxels)
    }
}

impl Default for VoxModel {
    fn default() -> Self {
        Self::new([0, 0, 0], Vec::new())
    }
}

/// Every model block held by one container, plus its version stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxFile {
    pub version: i32,
    pub models: Vec<VoxModel>,
}

impl VoxFile {
    /// Take the first model block.
    pub fn into_first_model(self) -> Option<VoxModel> {
        self.models.into_iter().next()
    }
}

/// `(max(x)+1, max(y)+1, max(z)+1)` over a voxel list; zero when empty.
pub fn fitted_size(voxels: &[Voxel]) -> [u32; 3] {
    voxels.iter().fold([0u32; 3], |acc, v| {
        [
            acc[0].max(v.x as u32 + 1),
            acc[1].max(v.y as u32 + 1),
            acc[2].max(v.z as u32 + 1),
        ]
    })
}

/// Occupied cells of a model: `min` inclusive, `max` exclusive, in voxel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelBounds {
    pub min: [u32; 3],
    pub max: [u32; 3],
}

impl VoxelBounds {
    /// Tight bounds of a voxel list; `None` when it is empty.
    pub fn of(voxels: &[Voxel]) -> Option<Self> {
        let (first, rest) = voxels.split_first()?;
        let start = first.position().map(u32::from);
        let (min, max) = rest.iter().fold((start, start), |(mut lo, mut hi), v| {
            for (axis, c) in v.position().into_iter().enumerate() {
                lo[axis] = lo[axis].min(c as u32);
                hi[axis] = hi[axis].max(c as u32);
            }
            (lo, hi)
        });
        Some(Self {
            min,
            max: max.map(|c| c + 1),
        })
    }

    pub fn dimensions(&self) -> [u32; 3] {
        [0, 1, 2].map(|axis| self.max[axis] - self.min[axis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitted_size() {
        let voxels = vec![Voxel::new(0, 3, 1, 1), Voxel::new(2, 0, 0, 5)];
        assert_eq!(fitted_size(&voxels), [3, 4, 2]);
        assert_eq!(fitted_size(&[]), [0, 0, 0]);
    }

    #[test]
    fn test_model_bounds() {
        let model = VoxModel::fitted(vec![Voxel::new(1, 1, 1, 1), Voxel::new(3, 2, 1, 1)]);
        let bounds = model.bounds().unwrap();
        assert_eq!(bounds.min, [1, 1, 1]);
        assert_eq!(bounds.max, [4, 3, 2]);
        assert_eq!(bounds.dimensions(), [3, 2, 1]);
        assert!(VoxModel::default().bounds().is_none());

        // Declared size can exceed what is occupied.
        let sparse = VoxModel::new([10, 10, 10], vec![Voxel::new(255, 0, 7, 1)]);
        let bounds = sparse.bounds().unwrap();
        assert_eq!(bounds.min, [255, 0, 7]);
        assert_eq!(bounds.max, [256, 1, 8]);
        assert_eq!(bounds.dimensions(), [1, 1, 1]);
    }

    #[test]
    fn test_model_json_round_trip() {
        let model = VoxModel::new([2, 2, 2], vec![Voxel::new(0, 1, 0, 9)])
            .with_palette(Palette::grey_ramp());
        let json = serde_json::to_string(&model).unwrap();
        let back: VoxModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_model_json_default_palette() {
        let json = r#"{"size_x":1,"size_y":1,"size_z":1,"voxels":[{"x":0,"y":0,"z":0,"color_index":1}]}"#;
        let model: VoxModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.palette, Palette::default());
        assert_eq!(model.voxel_count(), 1);
    }
}
