//! Wavefront OBJ export.
//!
//! The output is the minimal OBJ subset: one `o` line, then every `v` line,
//! then every `f` line. Face indices are 1-based and global.

use crate::mesher::{CubeMesher, ExportOptions, Mesh};
use crate::types::VoxModel;
use std::fmt::Write;

/// Export a model as per-voxel cubes with the given cube size.
pub fn export_obj(model: &VoxModel, cube_size: f32) -> String {
    export_obj_with(model, &ExportOptions::default().with_cube_size(cube_size))
}

/// Export a model as per-voxel cubes.
pub fn export_obj_with(model: &VoxModel, options: &ExportOptions) -> String {
    let mesh = CubeMesher::with_options(options.clone()).mesh(model);
    write_obj(&mesh, &options.object_name, options.vertex_colors)
}

/// Serialize a mesh as OBJ text.
pub fn write_obj(mesh: &Mesh, name: &str, vertex_colors: bool) -> String {
    // ~40 bytes per vertex line, ~20 per face line
    let mut obj = String::with_capacity(32 + mesh.vertex_count() * 40 + mesh.triangle_count() * 20);

    writeln!(obj, "o {}", name).unwrap();

    for vertex in &mesh.vertices {
        let [x, y, z] = vertex.position;
        if vertex_colors {
            let [r, g, b, _] = vertex.color;
            writeln!(obj, "v {} {} {} {} {} {}", x, y, z, r, g, b).unwrap();
        } else {
            writeln!(obj, "v {} {} {}", x, y, z).unwrap();
        }
    }

    for [a, b, c] in mesh.triangles() {
        writeln!(obj, "f {} {} {}", a + 1, b + 1, c + 1).unwrap();
    }

    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::types::Voxel;

    fn count_lines(text: &str, prefix: &str) -> usize {
        text.lines().filter(|l| l.starts_with(prefix)).count()
    }

    #[test]
    fn test_export_single_voxel() {
        let model = VoxModel::new([1, 1, 1], vec![Voxel::new(0, 0, 0, 1)]);
        let obj = export_obj(&model, 1.0);

        assert!(obj.starts_with("o vox_model\n"));
        assert_eq!(count_lines(&obj, "v "), 8);
        assert_eq!(count_lines(&obj, "f "), 12);

        let lines: Vec<&str> = obj.lines().collect();
        assert_eq!(lines[1], "v 0 0 0");
        assert_eq!(lines[7], "v 1 1 1");
        assert_eq!(lines[9], "f 1 2 3");
        assert_eq!(lines[10], "f 1 3 4");
        assert_eq!(lines[11], "f 8 7 6");
    }

    #[test]
    fn test_export_cardinality_and_global_indices() {
        let voxels: Vec<Voxel> = (0..5).map(|i| Voxel::new(i, i, 0, 1)).collect();
        let model = VoxModel::fitted(voxels);
        let obj = export_obj(&model, 2.0);

        assert_eq!(count_lines(&obj, "v "), 40);
        assert_eq!(count_lines(&obj, "f "), 60);

        let last_face = obj.lines().last().unwrap();
        // Last quad of the fifth cube is 5 1 4 8, offset by 32.
        assert_eq!(last_face, "f 37 36 40");
        assert!(obj.contains("v 8 8 0\n"));
    }

    #[test]
    fn test_export_empty_model() {
        let obj = export_obj(&VoxModel::default(), 1.0);
        assert_eq!(obj, "o vox_model\n");
    }

    #[test]
    fn test_export_with_vertex_colors() {
        let model = VoxModel::fitted(vec![Voxel::new(0, 0, 0, 255)])
            .with_palette(Palette::grey_ramp());
        let options = ExportOptions::default()
            .with_object_name("colored")
            .with_vertex_colors(true);
        let obj = export_obj_with(&model, &options);

        assert!(obj.starts_with("o colored\n"));
        let first_vertex = obj.lines().nth(1).unwrap();
        let parts: Vec<&str> = first_vertex.split_whitespace().collect();
        assert_eq!(parts.len(), 7);
        assert_eq!(parts[4], parts[5]);
    }
}
