//! glTF/GLB export.
//!
//! Writes the per-voxel cube mesh as a single primitive with positions,
//! palette vertex colors and `u32` indices. No textures are involved.

use crate::error::{Result, VoxError};
use crate::mesher::{CubeMesher, ExportOptions, Mesh};
use crate::types::VoxModel;
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;

/// Export a model to GLB format (binary glTF).
pub fn export_glb(model: &VoxModel, options: &ExportOptions) -> Result<Vec<u8>> {
    let mesh = CubeMesher::with_options(options.clone()).mesh(model);
    if mesh.is_empty() {
        return Err(VoxError::Export("Cannot export empty mesh".to_string()));
    }
    write_glb(&mesh)
}

/// Serialize a mesh as GLB.
pub fn write_glb(mesh: &Mesh) -> Result<Vec<u8>> {
    // positions | colors | indices, every element 4 bytes wide
    let mut buffer_data = Vec::with_capacity(mesh.vertex_count() * 28 + mesh.indices.len() * 4);

    let pos_offset = buffer_data.len();
    extend_f32(&mut buffer_data, &mesh.positions_flat());
    let color_offset = buffer_data.len();
    extend_f32(&mut buffer_data, &linear_colors(mesh));
    let idx_offset = buffer_data.len();
    for index in &mesh.indices {
        buffer_data.extend_from_slice(&index.to_le_bytes());
    }
    let buffer_len = buffer_data.len();

    let (min, max) = mesh.bounds();
    let vertex_count = mesh.vertex_count();

    let buffer_views = vec![
        create_buffer_view(pos_offset, color_offset - pos_offset, json::buffer::Target::ArrayBuffer),
        create_buffer_view(color_offset, idx_offset - color_offset, json::buffer::Target::ArrayBuffer),
        create_buffer_view(idx_offset, buffer_len - idx_offset, json::buffer::Target::ElementArrayBuffer),
    ];

    let accessors = vec![
        create_accessor(0, vertex_count, json::accessor::Type::Vec3, json::accessor::ComponentType::F32, Some(min), Some(max)),
        create_accessor(1, vertex_count, json::accessor::Type::Vec4, json::accessor::ComponentType::F32, None, None),
        create_accessor(2, mesh.indices.len(), json::accessor::Type::Scalar, json::accessor::ComponentType::U32, None, None),
    ];

    let translucent = mesh.vertices.iter().any(|v| v.color[3] < 1.0);
    let alpha_mode = if translucent {
        json::material::AlphaMode::Blend
    } else {
        json::material::AlphaMode::Opaque
    };

    let root = json::Root {
        accessors,
        buffers: vec![json::Buffer {
            byte_length: USize64(buffer_len as u64),
            extensions: Default::default(),
            extras: Default::default(),
            uri: None,
        }],
        buffer_views,
        materials: vec![create_vertex_color_material(alpha_mode)],
        meshes: vec![json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            primitives: vec![create_primitive(0, 1, 2, 0)],
            weights: None,
        }],
        nodes: vec![json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(json::Index::new(0)),
            rotation: None,
            scale: None,
            translation: None,
            skin: None,
            weights: None,
        }],
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            nodes: vec![json::Index::new(0)],
        }],
        scene: Some(json::Index::new(0)),
        ..Default::default()
    };

    let json_string = json::serialize::to_string(&root)
        .map_err(|e| VoxError::Export(format!("Failed to serialize glTF JSON: {}", e)))?;

    Ok(glb_container(json_string.into_bytes(), buffer_data))
}

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

/// Frame a JSON document and its binary buffer as a GLB file.
///
/// Chunks are padded to 4 bytes: JSON with spaces, BIN with zeros.
fn glb_container(json: Vec<u8>, bin: Vec<u8>) -> Vec<u8> {
    let chunks = [(CHUNK_JSON, json, b' '), (CHUNK_BIN, bin, 0u8)];
    let padded = |len: usize| len.div_ceil(4) * 4;
    let total: usize = 12 + chunks.iter().map(|(_, data, _)| 8 + padded(data.len())).sum::<usize>();

    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());

    for (kind, data, pad) in chunks {
        let len = padded(data.len());
        glb.extend_from_slice(&(len as u32).to_le_bytes());
        glb.extend_from_slice(&kind.to_le_bytes());
        glb.extend_from_slice(&data);
        glb.resize(glb.len() + len - data.len(), pad);
    }

    glb
}

/// COLOR_0 is linear; palette colors are sRGB. Alpha is already linear.
fn linear_colors(mesh: &Mesh) -> Vec<f32> {
    mesh.vertices
        .iter()
        .flat_map(|v| {
            let [r, g, b, a] = v.color;
            [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
        })
        .collect()
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn extend_f32(buffer: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
}

fn create_buffer_view(offset: usize, size: usize, target: json::buffer::Target) -> json::buffer::View {
    json::buffer::View {
        buffer: json::Index::new(0),
        byte_length: USize64(size as u64),
        byte_offset: Some(USize64(offset as u64)),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        target: Some(Valid(target)),
    }
}

fn create_accessor(
    buffer_view: u32,
    count: usize,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    min: Option<[f32; 3]>,
    max: Option<[f32; 3]>,
) -> json::Accessor {
    json::Accessor {
        buffer_view: Some(json::Index::new(buffer_view)),
        byte_offset: Some(USize64(0)),
        count: USize64(count as u64),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min: min.map(|m| json::Value::from(m.to_vec())),
        max: max.map(|m| json::Value::from(m.to_vec())),
        normalized: false,
        sparse: None,
    }
}

fn create_primitive(positions: u32, colors: u32, indices: u32, material: u32) -> json::mesh::Primitive {
    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(Valid(json::mesh::Semantic::Positions), json::Index::new(positions));
    attributes.insert(Valid(json::mesh::Semantic::Colors(0)), json::Index::new(colors));

    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: Some(json::Index::new(indices)),
        material: Some(json::Index::new(material)),
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    }
}

/// Untextured material; color comes from COLOR_0.
fn create_vertex_color_material(alpha_mode: json::material::AlphaMode) -> json::Material {
    json::Material {
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_texture: None,
            base_color_factor: json::material::PbrBaseColorFactor([1.0, 1.0, 1.0, 1.0]),
            metallic_factor: json::material::StrengthFactor(0.0),
            roughness_factor: json::material::StrengthFactor(1.0),
            metallic_roughness_texture: None,
            extensions: Default::default(),
            extras: Default::default(),
        },
        alpha_mode: Valid(alpha_mode),
        alpha_cutoff: None,
        double_sided: true,
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: json::material::EmissiveFactor([0.0, 0.0, 0.0]),
        extensions: Default::default(),
        extras: Default::default(),
    }
}
