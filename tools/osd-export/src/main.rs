//! osd-export - OSDSYS asset export tool
//!
//! Converts assets dumped from the PS2 system menu (ICOB models, GS texture
//! dumps, SPU2 sound archives) to OBJ, PNG and WAV.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use osd_common::{
    BinarySerializable, IcobHeader, PixelFormat, SoundOptions, SplitConfig, TextureOptions,
    VagHeader, decode_icob, detect_format,
};
use std::path::{Path, PathBuf};

// Use modules from library
use osd_export::{audio, manifest, model, texture};

#[derive(Parser)]
#[command(name = "osd-export")]
#[command(about = "OSDSYS asset export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export an ICOB model as Wavefront OBJ
    Model {
        /// Input ICOB file
        input: PathBuf,

        /// Output .obj file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write every morph target as its own object
        #[arg(long)]
        all_shapes: bool,
    },

    /// Export a GS texture dump as PNG
    Texture {
        /// Input texture dump
        input: PathBuf,

        /// Output .png file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pixel format override (psm32, psm24, psm16, psm8, psm4)
        #[arg(short, long)]
        format: Option<PixelFormat>,

        /// Width override
        #[arg(long)]
        width: Option<u32>,

        /// Height override
        #[arg(long)]
        height: Option<u32>,

        /// Pixel data offset override
        #[arg(long)]
        offset: Option<usize>,

        /// Read 4-bit dumps through the GS page layout
        #[arg(long)]
        tiled_4bit: bool,

        /// Fail on unrecognized file sizes instead of guessing
        #[arg(long)]
        strict: bool,
    },

    /// Export every stream of a sound file as WAV
    Sound {
        /// Input VAGp file or raw archive
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore VAGp headers, split on stream markers only
        #[arg(long)]
        headerless: bool,

        /// Sample rate for headerless streams
        #[arg(long, default_value_t = osd_common::formats::DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Minimum stream length in bytes
        #[arg(long, default_value_t = SplitConfig::default().min_stream_len)]
        min_stream_len: usize,
    },

    /// List VAGp headers and headerless stream boundaries
    Scan {
        /// Input sound file
        input: PathBuf,
    },

    /// Describe a file: VAGp headers, ICOB header, or detected texture layout
    Info {
        /// Input file
        input: PathBuf,
    },

    /// Build assets from a manifest file
    Build {
        /// Path to osd-assets.toml manifest
        #[arg(default_value = manifest::MANIFEST_FILE)]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to osd-assets.toml manifest
        #[arg(default_value = manifest::MANIFEST_FILE)]
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Model {
            input,
            output,
            all_shapes,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("obj"));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            model::convert_model(&input, &output, all_shapes)?;
            tracing::info!("Done!");
        }

        Commands::Texture {
            input,
            output,
            format,
            width,
            height,
            offset,
            tiled_4bit,
            strict,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("png"));
            let options = TextureOptions {
                tiled_4bit,
                strict,
                format,
                width,
                height,
                offset,
            };
            tracing::info!("Converting {:?} -> {:?}", input, output);
            texture::convert_texture(&input, &output, &options)?;
            tracing::info!("Done!");
        }

        Commands::Sound {
            input,
            output,
            headerless,
            sample_rate,
            min_stream_len,
        } => {
            let out_dir = output.unwrap_or_else(|| sibling_dir(&input));
            let options = SoundOptions {
                sample_rate,
                split: SplitConfig { min_stream_len },
                headerless,
            };
            tracing::info!("Converting {:?} -> {:?}", input, out_dir);
            let written = audio::convert_sound(&input, &out_dir, &options)?;
            for path in &written {
                println!("{}", path.display());
            }
        }

        Commands::Scan { input } => {
            let data = read(&input)?;
            let map = audio::scan_streams(&data, &SoundOptions::default());
            println!("{} ({} bytes)", input.display(), data.len());
            println!("  VAGp headers: {}", map.vag_offsets.len());
            for offset in &map.vag_offsets {
                println!("    {:#08x}", offset);
            }
            println!("  Headerless streams: {}", map.split_ranges.len());
            for range in &map.split_ranges {
                println!(
                    "    {:#08x}..{:#08x} ({} blocks)",
                    range.start,
                    range.end,
                    range.len() / osd_vag::VAG_BLOCK_SIZE
                );
            }
        }

        Commands::Info { input } => {
            let data = read(&input)?;
            print_info(&input, &data);
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building assets from {:?}", manifest);
            let config = manifest::AssetManifest::load(&manifest)?;
            let manifest_dir = manifest.parent().unwrap_or(Path::new("."));
            manifest::build_all(&config, manifest_dir, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::AssetManifest::load(&manifest)?;
            config.validate()?;
            tracing::info!("Manifest is valid!");
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    osd_common::read_asset(path).with_context(|| format!("Failed to read {:?}", path))
}

/// Directory an input file sits in
fn sibling_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_info(path: &Path, data: &[u8]) {
    println!("{} ({} bytes)", path.display(), data.len());

    let offsets = osd_common::scan_vag_headers(data);
    if !offsets.is_empty() {
        println!("  {}: {} stream(s)", VagHeader::NAME, offsets.len());
        for offset in offsets {
            if let Some(h) = VagHeader::deserialize(&data[offset..]) {
                println!(
                    "    {:#08x} '{}' {} Hz, {} data bytes",
                    offset,
                    h.name(),
                    h.sample_rate,
                    h.data_size
                );
            }
        }
        return;
    }

    if let Some(h) = IcobHeader::deserialize(data).filter(IcobHeader::has_valid_magic) {
        println!(
            "  {}: {} vertices, {} shape(s), texture type {}, {} bytes/vertex",
            IcobHeader::NAME,
            h.vertex_count,
            h.shape_count,
            h.texture_type,
            h.vertex_stride()
        );
        match decode_icob(data) {
            Ok(mesh) => println!("    {} triangles", mesh.triangle_count()),
            Err(e) => println!("    not decodable: {e}"),
        }
        return;
    }

    let layout = detect_format(data.len());
    println!(
        "  Texture: {}x{} {}, offset {} ({:?})",
        layout.width, layout.height, layout.format, layout.offset, layout.source
    );
}
