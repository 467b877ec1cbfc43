use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use json_pretty_compact::PrettyCompactFormatter;
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Serializer;

use crate::{
    codec::{
        asm::bytes_to_asm,
        binary::{encode_chunkset, encode_palettes, encode_tilemap, encode_tileset},
        project::{project_from_json, project_to_json},
    },
    render::PixelBuffer,
    state::{GlobalConfig, ProjectData},
};

/// The four kinds of asset that can be imported and exported on their own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AssetKind {
    Palette,
    Tileset,
    Chunkset,
    Tilemap,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Palette,
        AssetKind::Tileset,
        AssetKind::Chunkset,
        AssetKind::Tilemap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Palette => "palette",
            AssetKind::Tileset => "tileset",
            AssetKind::Chunkset => "chunkset",
            AssetKind::Tilemap => "tilemap",
        }
    }

    fn label(self) -> &'static str {
        match self {
            AssetKind::Palette => "Palettes",
            AssetKind::Tileset => "Tileset",
            AssetKind::Chunkset => "Chunkset",
            AssetKind::Tilemap => "Tilemap",
        }
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create directory {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("Unable to write {}", path.display()))?;
    Ok(())
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    info!("Saving {}", path.display());
    let formatter = PrettyCompactFormatter::new();
    let mut data_bytes = vec![];
    let mut ser = Serializer::with_formatter(&mut data_bytes, formatter);
    data.serialize(&mut ser)?;
    write_file(path, &data_bytes)
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    info!("Loading {}", path.display());
    let data_bytes =
        fs::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
    let data: T = serde_json::from_slice(&data_bytes)
        .with_context(|| format!("Unable to parse {}", path.display()))?;
    Ok(data)
}

pub fn get_global_config_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("", "", "Turbulence")
        .context("Unable to open global config directory.")?;
    let config_dir = project_dirs.config_dir();
    let config_path = config_dir.join("config.json");
    Ok(config_path)
}

/// A missing config file is not an error; defaults are used instead.
pub fn load_global_config(path: &Path) -> Result<GlobalConfig> {
    if !path.exists() {
        info!("No global config at {}, using defaults", path.display());
        return Ok(GlobalConfig::default());
    }
    load_json(path)
}

pub fn save_global_config(path: &Path, config: &mut GlobalConfig) -> Result<()> {
    if config.modified {
        save_json(path, config)?;
        config.modified = false;
    }
    Ok(())
}

pub fn save_project(path: &Path, project: &ProjectData) -> Result<()> {
    info!("Saving project {}", path.display());
    let data = project_to_json(project)?;
    write_file(path, &data)
}

pub fn load_project(path: &Path) -> Result<ProjectData> {
    info!("Loading project {}", path.display());
    let data = fs::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
    let project = project_from_json(&data)
        .with_context(|| format!("Invalid project file {}", path.display()))?;
    Ok(project)
}

pub fn save_png(path: &Path, buf: &PixelBuffer) -> Result<()> {
    info!("Saving {} ({}x{})", path.display(), buf.width, buf.height);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file =
        fs::File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), buf.width as u32, buf.height as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&buf.to_rgba8())?;
    writer.finish()?;
    Ok(())
}

/// `.asm` and `.s` files hold assembly source; anything else is raw binary.
pub fn is_asm_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("asm") || e.eq_ignore_ascii_case("s"))
        .unwrap_or(false)
}

pub fn encode_asset(project: &ProjectData, kind: AssetKind) -> Result<Vec<u8>> {
    let data = match kind {
        AssetKind::Palette => encode_palettes(&project.palettes),
        AssetKind::Tileset => encode_tileset(&project.tileset)?,
        AssetKind::Chunkset => encode_chunkset(&project.chunkset)?,
        AssetKind::Tilemap => encode_tilemap(&project.tilemap)?,
    };
    Ok(data)
}

pub fn export_asset(path: &Path, project: &ProjectData, kind: AssetKind) -> Result<()> {
    info!("Exporting {} to {}", kind.name(), path.display());
    let data = encode_asset(project, kind)
        .with_context(|| format!("Unable to encode {}", kind.name()))?;
    if is_asm_path(path) {
        write_file(path, bytes_to_asm(&data, Some(kind.label())).as_bytes())
    } else {
        write_file(path, &data)
    }
}

/// `out/level.asm` becomes `out/level_palette.asm`, `out/level_tileset.asm`, ...
pub fn sibling_path(base: &Path, kind: AssetKind) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{}_{}", stem, kind.name());
    if let Some(ext) = base.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    base.with_file_name(name)
}

pub fn export_all(base: &Path, project: &ProjectData) -> Result<Vec<PathBuf>> {
    let mut paths = vec![];
    for kind in AssetKind::ALL {
        let path = sibling_path(base, kind);
        export_asset(&path, project, kind)?;
        paths.push(path);
    }
    Ok(paths)
}
