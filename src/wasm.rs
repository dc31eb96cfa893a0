//! WASM bindings for voxel-shaper.
//!
//! This module provides JavaScript-friendly APIs for use in the browser.

use crate::mesher::ExportOptions;
use crate::vox::{Decoder, Strictness};
use crate::VoxModel;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the browser console
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// A decoded voxel model held on the Rust side.
#[wasm_bindgen]
pub struct VoxModelHandle {
    inner: VoxModel,
    diagnostics: Vec<String>,
}

#[wasm_bindgen]
impl VoxModelHandle {
    /// Create an empty model with the given grid size.
    #[wasm_bindgen(constructor)]
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> VoxModelHandle {
        VoxModelHandle {
            inner: VoxModel::new([size_x, size_y, size_z], Vec::new()),
            diagnostics: Vec::new(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn size_x(&self) -> u32 {
        self.inner.size_x
    }

    #[wasm_bindgen(getter)]
    pub fn size_y(&self) -> u32 {
        self.inner.size_y
    }

    #[wasm_bindgen(getter)]
    pub fn size_z(&self) -> u32 {
        self.inner.size_z
    }

    #[wasm_bindgen(getter)]
    pub fn voxel_count(&self) -> usize {
        self.inner.voxel_count()
    }

    /// Append a voxel.
    pub fn add_voxel(&mut self, x: u8, y: u8, z: u8, color_index: u8) {
        self.inner.voxels.push(crate::Voxel::new(x, y, z, color_index));
    }

    /// Problems the lenient decoder stepped over, as display strings.
    #[wasm_bindgen(getter)]
    pub fn diagnostics(&self) -> js_sys::Array {
        self.diagnostics.iter().map(|d| JsValue::from_str(d)).collect()
    }

    /// Serialize the model (size, voxels, palette) as JSON.
    pub fn to_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.inner).map_err(js_error)
    }

    /// Build a model from JSON produced by `to_json`.
    pub fn from_json(json: &str) -> Result<VoxModelHandle, JsError> {
        let inner: VoxModel =
            serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid JSON: {}", e)))?;
        Ok(VoxModelHandle {
            inner,
            diagnostics: Vec::new(),
        })
    }
}

/// Decode `.vox` bytes into a model handle.
///
/// With `lenient`, damaged files still load when any complete model could be
/// recovered; the handle then carries the diagnostics.
#[wasm_bindgen]
pub fn parse_vox(data: &[u8], lenient: bool) -> Result<VoxModelHandle, JsError> {
    let strictness = if lenient {
        Strictness::Lenient
    } else {
        Strictness::Strict
    };
    let decoded = Decoder::new(strictness).decode_file(data).map_err(js_error)?;
    let diagnostics: Vec<String> = decoded.diagnostics.iter().map(|d| d.to_string()).collect();

    match decoded.into_model() {
        Some(inner) => Ok(VoxModelHandle { inner, diagnostics }),
        None => Err(JsError::new(&format!(
            "No model could be decoded: {}",
            diagnostics.join("; ")
        ))),
    }
}

/// Encode a model handle as `.vox` bytes.
#[wasm_bindgen]
pub fn build_vox(model: &VoxModelHandle) -> Result<Vec<u8>, JsError> {
    crate::encode(&model.inner).map_err(js_error)
}

/// Export a model as OBJ text, one cube per voxel.
#[wasm_bindgen]
pub fn vox_to_obj(model: &VoxModelHandle, cube_size: f32) -> String {
    crate::export_obj(&model.inner, cube_size)
}

/// Export a model as GLB bytes with palette vertex colors.
#[wasm_bindgen]
pub fn vox_to_glb(model: &VoxModelHandle, cube_size: f32) -> Result<Vec<u8>, JsError> {
    let options = ExportOptions::default().with_cube_size(cube_size);
    crate::export_glb(&model.inner, &options).map_err(js_error)
}

/// Voxelize OBJ text.
#[wasm_bindgen]
pub fn obj_to_vox(text: &str, voxel_size: f64) -> Result<VoxModelHandle, JsError> {
    let inner = crate::import_obj(text, voxel_size).map_err(js_error)?;
    Ok(VoxModelHandle {
        inner,
        diagnostics: Vec::new(),
    })
}
