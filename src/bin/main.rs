//! Voxel Shaper CLI
//!
//! Convert MagicaVoxel `.vox` models to and from meshes.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use voxel_shaper::{
    encode, export_glb, export_obj_with, import_obj_with, Decoder, ExportOptions, ImportOptions,
    Palette, Strictness, VoxFile, VoxModel, ZeroIndex,
};

#[derive(Parser)]
#[command(name = "voxel-shaper")]
#[command(author, version, about = "Convert MagicaVoxel models to and from meshes", long_about = None)]
struct Cli {
    /// Print debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the models stored in a .vox file
    Info {
        /// Input .vox file
        #[arg(short, long)]
        input: PathBuf,

        /// Recover what can be read from damaged files
        #[arg(long)]
        lenient: bool,

        /// Print the decoded file as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a .vox model as OBJ, one cube per voxel
    ToObj {
        /// Input .vox file
        #[arg(short, long)]
        input: PathBuf,

        /// Output OBJ file
        #[arg(short, long)]
        output: PathBuf,

        /// Edge length of each voxel cube
        #[arg(long, default_value = "1.0")]
        cube_size: f32,

        /// Append palette colors to vertex lines
        #[arg(long)]
        vertex_colors: bool,

        /// Treat color index 0 as empty instead of clamping it to 1
        #[arg(long)]
        skip_zero: bool,

        /// Recover what can be read from damaged files
        #[arg(long)]
        lenient: bool,
    },

    /// Voxelize an OBJ mesh into a .vox model
    FromObj {
        /// Input OBJ file
        #[arg(short, long)]
        input: PathBuf,

        /// Output .vox file
        #[arg(short, long)]
        output: PathBuf,

        /// Edge length of one voxel in mesh units
        #[arg(long, default_value = "1.0")]
        voxel_size: f64,

        /// Color index given to every voxel
        #[arg(long, default_value = "1")]
        color: u8,

        /// 256x1 PNG to use as the palette
        #[arg(long)]
        palette: Option<PathBuf>,
    },

    /// Export a .vox model as binary glTF with vertex colors
    ToGlb {
        /// Input .vox file
        #[arg(short, long)]
        input: PathBuf,

        /// Output GLB file
        #[arg(short, long)]
        output: PathBuf,

        /// Edge length of each voxel cube
        #[arg(long, default_value = "1.0")]
        cube_size: f32,

        /// Treat color index 0 as empty instead of clamping it to 1
        #[arg(long)]
        skip_zero: bool,
    },

    /// Write the first model of a .vox file as JSON
    ToJson {
        /// Input .vox file
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Build a .vox file from model JSON
    FromJson {
        /// Input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output .vox file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a palette as a 256x1 PNG
    Palette {
        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Take the palette from this .vox file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Use the grey ramp instead of the MagicaVoxel default
        #[arg(long, conflicts_with = "input")]
        ramp: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_target_level(log::LevelFilter::Off)
            .set_location_level(log::LevelFilter::Off)
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    match cli.command {
        Commands::Info { input, lenient, json } => {
            show_info(&input, lenient, json)?;
        }
        Commands::ToObj {
            input,
            output,
            cube_size,
            vertex_colors,
            skip_zero,
            lenient,
        } => {
            let model = read_model(&input, lenient)?;
            let options = ExportOptions::default()
                .with_cube_size(cube_size)
                .with_vertex_colors(vertex_colors)
                .with_zero_index(zero_index(skip_zero));
            let obj = export_obj_with(&model, &options);
            fs::write(&output, &obj)?;
            println!("Exported {} voxel cubes to {:?}", model.voxel_count(), output);
        }
        Commands::FromObj {
            input,
            output,
            voxel_size,
            color,
            palette,
        } => {
            voxelize_obj(&input, &output, voxel_size, color, palette.as_deref())?;
        }
        Commands::ToGlb {
            input,
            output,
            cube_size,
            skip_zero,
        } => {
            let model = read_model(&input, false)?;
            let options = ExportOptions::default()
                .with_cube_size(cube_size)
                .with_zero_index(zero_index(skip_zero));
            let glb_data = export_glb(&model, &options)?;
            fs::write(&output, &glb_data)?;
            println!("Exported GLB ({} bytes) to {:?}", glb_data.len(), output);
        }
        Commands::ToJson { input, output } => {
            let model = read_model(&input, false)?;
            fs::write(&output, serde_json::to_string_pretty(&model)?)?;
            println!("Wrote {} voxels to {:?}", model.voxel_count(), output);
        }
        Commands::FromJson { input, output } => {
            let model: VoxModel = serde_json::from_str(&fs::read_to_string(&input)?)?;
            let data = encode(&model)?;
            fs::write(&output, &data)?;
            println!("Wrote {} bytes to {:?}", data.len(), output);
        }
        Commands::Palette { output, input, ramp } => {
            let palette = match input {
                Some(input) => read_model(&input, false)?.palette,
                None if ramp => Palette::grey_ramp(),
                None => Palette::default(),
            };
            fs::write(&output, palette.to_png()?)?;
            println!("Wrote palette to {:?}", output);
        }
    }

    Ok(())
}

fn zero_index(skip_zero: bool) -> ZeroIndex {
    if skip_zero {
        ZeroIndex::Empty
    } else {
        ZeroIndex::Clamp
    }
}

/// Decode a container. Diagnostics reach stderr through the logger only, so
/// stdout stays clean for `--json`.
fn decode_bytes(data: &[u8], lenient: bool) -> Result<Option<VoxFile>, Box<dyn std::error::Error>> {
    let strictness = if lenient {
        Strictness::Lenient
    } else {
        Strictness::Strict
    };
    Ok(Decoder::new(strictness).decode_file(data)?.file)
}

fn read_model(path: &Path, lenient: bool) -> Result<VoxModel, Box<dyn std::error::Error>> {
    println!("Loading {:?}...", path);
    decode_bytes(&fs::read(path)?, lenient)?
        .and_then(VoxFile::into_first_model)
        .ok_or_else(|| format!("No model could be read from {:?}", path).into())
}

fn show_info(path: &Path, lenient: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let Some(file) = decode_bytes(&fs::read(path)?, lenient)? else {
        return Err(format!("No model could be read from {:?}", path).into());
    };
    print!("{}", render_info(&file, json)?);
    Ok(())
}

fn render_info(file: &VoxFile, json: bool) -> Result<String, Box<dyn std::error::Error>> {
    use std::fmt::Write;

    if json {
        return Ok(serde_json::to_string_pretty(file)? + "\n");
    }

    let mut out = String::new();
    writeln!(out, "\nVOX File Info:")?;
    writeln!(out, "  Version: {}", file.version)?;
    writeln!(out, "  Models: {}", file.models.len())?;
    for (i, model) in file.models.iter().enumerate() {
        let [x, y, z] = model.dimensions();
        writeln!(out, "  [{}] {}x{}x{}, {} voxels", i, x, y, z, model.voxel_count())?;
        if let Some(bounds) = model.bounds() {
            writeln!(out, "      occupied {:?} to {:?}", bounds.min, bounds.max)?;
        }
    }
    Ok(out)
}

fn voxelize_obj(
    input_path: &Path,
    output_path: &Path,
    voxel_size: f64,
    color: u8,
    palette_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading mesh from {:?}...", input_path);
    let text = fs::read_to_string(input_path)?;

    let mut options = ImportOptions::default()
        .with_voxel_size(voxel_size)
        .with_color_index(color);
    if let Some(palette_path) = palette_path {
        println!("Loading palette from {:?}...", palette_path);
        options = options.with_palette(Palette::from_png(&fs::read(palette_path)?)?);
    }

    println!("Voxelizing with voxel size {}...", voxel_size);
    let model = import_obj_with(&text, &options)?;
    let [x, y, z] = model.dimensions();
    println!("  Generated {} voxels in a {}x{}x{} grid", model.voxel_count(), x, y, z);

    let data = encode(&model)?;
    fs::write(output_path, &data)?;
    println!("Wrote {} bytes to {:?}", data.len(), output_path);

    Ok(())
}
