use std::{io::Cursor, path::Path};

use anyhow::{bail, ensure, Context, Result};
use log::{info, warn};

use crate::{
    codec::{
        asm::extract_bytes,
        binary::{decode_chunkset, decode_palettes, decode_tilemap, decode_tileset},
        image::{palette_from_image, tileset_from_image, IndexedImage},
    },
    common::{Color, PaletteIdx, PALETTE_COUNT, PALETTE_SIZE},
    message::Message,
    persist::{is_asm_path, AssetKind},
    state::EditorState,
    update::update,
};

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

pub fn is_image_path(path: &Path) -> bool {
    matches!(extension(path).as_str(), "png" | "bmp" | "jpg" | "jpeg")
}

/// Raw bytes of a `.bin` file, or the bytes defined by the data directives of an `.asm`/`.s` file.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    if is_asm_path(path) {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        let bytes = extract_bytes(&source)
            .with_context(|| format!("Unable to extract data from {}", path.display()))?;
        info!("Extracted {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    } else {
        std::fs::read(path).with_context(|| format!("Unable to read {}", path.display()))
    }
}

/// Unpack one row of 1/2/4/8-bit palette indices, most significant bits first.
fn unpack_row(row: &[u8], width: usize, bit_depth: usize) -> Vec<u8> {
    let per_byte = 8 / bit_depth;
    let mask = ((1u16 << bit_depth) - 1) as u8;
    (0..width)
        .map(|x| {
            let byte = row[x / per_byte];
            let shift = 8 - bit_depth * (x % per_byte + 1);
            (byte >> shift) & mask
        })
        .collect()
}

/// Decode an indexed PNG keeping its color table and raw indices. Returns
/// `None` for any other PNG color type.
fn decode_indexed_png(data: &[u8]) -> Result<Option<IndexedImage>> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;
    let info = reader.info();
    if info.color_type != png::ColorType::Indexed {
        return Ok(None);
    }
    let width = info.width as usize;
    let height = info.height as usize;
    let bit_depth = info.bit_depth as usize;
    let color_table: Vec<Color> = info
        .palette
        .as_ref()
        .context("Indexed PNG has no palette")?
        .chunks_exact(3)
        .map(|c| Color::new(c[0], c[1], c[2]))
        .collect();
    ensure!(
        matches!(bit_depth, 1 | 2 | 4 | 8),
        "Unsupported indexed PNG bit depth {}",
        bit_depth
    );

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;
    let mut indices = Vec::with_capacity(width * height);
    for row in buf[..frame.buffer_size()].chunks(frame.line_size).take(height) {
        indices.extend(unpack_row(row, width, bit_depth));
    }
    Ok(Some(IndexedImage {
        width,
        height,
        color_table,
        indices,
    }))
}

pub fn load_image(path: &Path) -> Result<IndexedImage> {
    info!("Loading image {}", path.display());
    let data = std::fs::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
    if extension(path) == "png" {
        if let Some(image) = decode_indexed_png(&data)
            .with_context(|| format!("Unable to decode {}", path.display()))?
        {
            return Ok(image);
        }
        info!("{} is not indexed, indexing colors in order of appearance", path.display());
    }
    let rgba = image::load_from_memory(&data)
        .with_context(|| format!("Unable to decode {}", path.display()))?
        .to_rgba8();
    let image = IndexedImage::from_rgba(rgba.width() as usize, rgba.height() as usize, rgba.as_raw())
        .with_context(|| format!("Unable to index colors of {}", path.display()))?;
    if let Some(color) = hidden_first_color(rgba.as_raw(), &image) {
        warn!(
            "{} has no transparent pixels; its first color {:?} took index 0 and will render transparent",
            path.display(),
            color
        );
    }
    Ok(image)
}

/// The opaque color indexed at 0 when an RGBA image has no transparent pixel to claim it.
fn hidden_first_color(rgba: &[u8], image: &IndexedImage) -> Option<Color> {
    if rgba.chunks_exact(4).any(|p| p[3] == 0) {
        return None;
    }
    image.color_table.first().copied()
}

/// Lay `src` over `dst` from index 0, keeping `dst`'s length.
fn overlay<T: Clone>(dst: &[T], src: Vec<T>, what: &str) -> Vec<T> {
    if src.len() > dst.len() {
        warn!(
            "Imported {} {}s but the project holds {}; dropping the rest",
            src.len(),
            what,
            dst.len()
        );
    }
    let mut out = dst.to_vec();
    for (d, s) in out.iter_mut().zip(src) {
        *d = s;
    }
    out
}

/// Import one asset from `path` into the session. Palettes land in slots
/// starting at `slot`; tiles and chunks overwrite the project's collections from
/// id 0 without changing their capacity.
pub fn import_file(
    state: &mut EditorState,
    kind: AssetKind,
    path: &Path,
    slot: PaletteIdx,
) -> Result<()> {
    info!("Importing {} from {}", kind.name(), path.display());
    ensure!(
        (slot as usize) < PALETTE_COUNT,
        "Palette slot {} out of range (0..{})",
        slot,
        PALETTE_COUNT
    );
    let messages = if is_image_path(path) {
        let image = load_image(path)?;
        match kind {
            AssetKind::Palette => {
                if image.color_table.len() < PALETTE_SIZE {
                    warn!(
                        "{} has only {} colors, padding with black",
                        path.display(),
                        image.color_table.len()
                    );
                } else if image.color_table.len() > PALETTE_SIZE {
                    warn!(
                        "{} has {} colors, keeping the first {}",
                        path.display(),
                        image.color_table.len(),
                        PALETTE_SIZE
                    );
                }
                vec![Message::ReplacePalette {
                    slot,
                    palette: palette_from_image(&image),
                }]
            }
            AssetKind::Tileset => {
                let tileset = tileset_from_image(&image)
                    .with_context(|| format!("Unable to slice {} into tiles", path.display()))?;
                let mut merged = state.project.tileset.clone();
                merged.tiles = overlay(&merged.tiles, tileset.tiles, "tile");
                vec![Message::ReplaceTileset(merged)]
            }
            AssetKind::Chunkset | AssetKind::Tilemap => {
                bail!("A {} can't be imported from an image", kind.name())
            }
        }
    } else {
        let data = read_bytes(path)?;
        let project = &state.project;
        match kind {
            AssetKind::Palette => {
                let palettes = decode_palettes(&data)?;
                let room = PALETTE_COUNT - slot as usize;
                if palettes.len() > room {
                    warn!(
                        "{} holds {} palettes, only {} fit from slot {}",
                        path.display(),
                        palettes.len(),
                        room,
                        slot
                    );
                }
                palettes
                    .into_iter()
                    .take(room)
                    .enumerate()
                    .map(|(i, palette)| Message::ReplacePalette {
                        slot: slot + i as PaletteIdx,
                        palette,
                    })
                    .collect()
            }
            AssetKind::Tileset => {
                let tileset = decode_tileset(&data)?;
                let mut merged = project.tileset.clone();
                merged.tiles = overlay(&merged.tiles, tileset.tiles, "tile");
                vec![Message::ReplaceTileset(merged)]
            }
            AssetKind::Chunkset => {
                let chunkset = decode_chunkset(&data, project.chunkset.chunk_size)?;
                let mut merged = project.chunkset.clone();
                merged.chunks = overlay(&merged.chunks, chunkset.chunks, "chunk");
                vec![Message::ReplaceChunkset(merged)]
            }
            AssetKind::Tilemap => {
                let tilemap =
                    decode_tilemap(&data, project.tilemap.width, project.tilemap.height)?;
                vec![Message::ReplaceTilemap(tilemap)]
            }
        }
    };
    for message in messages {
        update(state, message)
            .with_context(|| format!("Unable to apply {} from {}", kind.name(), path.display()))?;
    }
    Ok(())
}
