//! The 256-entry color table shared by every voxel of a model.
//!
//! Colors are stored packed as `u32` values in the byte order they have in
//! the `RGBA` chunk: the little-endian integer of the bytes `R, G, B, A`,
//! so a packed value reads `0xAABBGGRR`. Producers and consumers must agree
//! on this order or red and blue swap.
//!
//! Palette slot `i` holds the color of color index `i + 1`; color index 0
//! has no slot of its own (see [`ZeroIndex`]).

use crate::error::{Result, VoxError};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Number of entries in every palette.
pub const PALETTE_LEN: usize = 256;

/// An unpacked 8-bit-per-channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a `0xAABBGGRR` value.
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: (packed & 0xff) as u8,
            g: ((packed >> 8) & 0xff) as u8,
            b: ((packed >> 16) & 0xff) as u8,
            a: (packed >> 24) as u8,
        }
    }

    /// Pack into the `0xAABBGGRR` layout used by the `RGBA` chunk.
    pub const fn to_packed(self) -> u32 {
        (self.r as u32) | (self.g as u32) << 8 | (self.b as u32) << 16 | (self.a as u32) << 24
    }

    /// Channels as floats in `[0, 1]`, without leaving sRGB encoding.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// How color index 0 is interpreted.
///
/// Files in the wild disagree on whether index 0 is "no voxel" or a real
/// lookup, so each caller picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroIndex {
    /// Index 0 is a lookup clamped to index 1.
    #[default]
    Clamp,
    /// Index 0 marks an unset voxel with no color.
    Empty,
}

/// A fixed table of 256 packed colors.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette(Box<[u32; PALETTE_LEN]>);

impl Palette {
    /// Build a palette from exactly 256 packed colors.
    pub fn from_slice(colors: &[u32]) -> Result<Self> {
        let table: [u32; PALETTE_LEN] = colors
            .try_into()
            .map_err(|_| VoxError::PaletteLength(colors.len()))?;
        Ok(Self(Box::new(table)))
    }

    pub fn from_array(colors: [u32; PALETTE_LEN]) -> Self {
        Self(Box::new(colors))
    }

    /// The simplified generated palette: an opaque grey ramp from black to white.
    pub fn grey_ramp() -> Self {
        let mut table = [0u32; PALETTE_LEN];
        for (i, slot) in table.iter_mut().enumerate() {
            let i = i as u32;
            *slot = 0xff00_0000 | (i << 16) | (i << 8) | i;
        }
        Self::from_array(table)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0[..]
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Packed color stored in a raw slot (0-based).
    pub fn slot(&self, slot: u8) -> u32 {
        self.0[slot as usize]
    }

    /// Color for a 1-based color index, honoring the caller's zero-index policy.
    pub fn color(&self, index: u8, zero: ZeroIndex) -> Option<Rgba> {
        match (index, zero) {
            (0, ZeroIndex::Empty) => None,
            _ => Some(index_to_color(index, self)),
        }
    }

    /// Encode as a 256×1 RGBA PNG, the usual palette file layout.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        use image::ImageEncoder;

        let pixels: Vec<u8> = self
            .iter()
            .flat_map(|packed| packed.to_le_bytes())
            .collect();

        let mut bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(std::io::Cursor::new(&mut bytes));
        encoder.write_image(
            &pixels,
            PALETTE_LEN as u32,
            1,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(bytes)
    }

    /// Decode any image holding exactly 256 pixels, read in row-major order.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)?.to_rgba8();
        let colors: Vec<u32> = img
            .pixels()
            .map(|p| u32::from_le_bytes(p.0))
            .collect();
        Self::from_slice(&colors)
    }
}

impl Default for Palette {
    /// The published MagicaVoxel reference palette.
    fn default() -> Self {
        Self::from_array(REFERENCE_PALETTE)
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Palette([{:#010x}, {:#010x}, ..])", self.0[0], self.0[1])
    }
}

impl Serialize for Palette {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for Palette {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let colors = Vec::<u32>::deserialize(deserializer)?;
        Palette::from_slice(&colors)
            .map_err(|_| de::Error::invalid_length(colors.len(), &"exactly 256 packed colors"))
    }
}

/// Look up a 1-based color index, clamping it to `[1, 255]`.
pub fn index_to_color(index: u8, palette: &Palette) -> Rgba {
    let index = index.max(1);
    Rgba::from_packed(palette.slot(index - 1))
}

/// MagicaVoxel's default palette in file order.
///
/// Slots 0..215 walk the 6×6×6 web-safe cube from white towards black with
/// blue varying fastest (pure black left out), followed by ten-step ramps
/// of red, green, blue and grey, and a final transparent slot.
pub const REFERENCE_PALETTE: [u32; PALETTE_LEN] = reference_palette();

const fn reference_palette() -> [u32; PALETTE_LEN] {
    const RAMP: [u32; 10] = [0xee, 0xdd, 0xbb, 0xaa, 0x88, 0x77, 0x55, 0x44, 0x22, 0x11];

    let mut table = [0u32; PALETTE_LEN];
    let mut i = 0;
    while i < 215 {
        let b = 0xff - 0x33 * (i % 6) as u32;
        let g = 0xff - 0x33 * ((i / 6) % 6) as u32;
        let r = 0xff - 0x33 * (i / 36) as u32;
        table[i] = 0xff00_0000 | (b << 16) | (g << 8) | r;
        i += 1;
    }

    let mut step = 0;
    while step < RAMP.len() {
        let v = RAMP[step];
        table[215 + step] = 0xff00_0000 | v;
        table[225 + step] = 0xff00_0000 | (v << 8);
        table[235 + step] = 0xff00_0000 | (v << 16);
        table[245 + step] = 0xff00_0000 | (v << 16) | (v << 8) | v;
        step += 1;
    }

    table[255] = 0x0000_0000;
    table
}
