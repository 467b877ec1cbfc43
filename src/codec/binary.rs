// Console-native binary layouts. Words are big-endian (68k byte order).
//
//   color:  ---- BBB-  GGG- RRR-      (2 bytes, 3-bit channels)
//   tile:   8 rows x 4 bytes, two 4bpp pixels per byte, high nibble first
//   chunk cell:  P LL H V IIIIIIIIIII  (priority, palette, flips, tile id)
//   map cell:    H V CCCCCCCCCCCCCC    (flips, chunk id)
use crate::{
    common::{
        Chunk, ChunkTileRef, Chunkset, Color, MapChunkRef, Palette, Tile, Tilemap, Tileset,
        PALETTE_SIZE, TILE_SIZE,
    },
    error::{check_index, Error, Result},
    helpers::{quantize_color, scale_color},
};

pub const COLOR_BYTES: usize = 2;
pub const TILE_BYTES: usize = 32;
pub const CELL_BYTES: usize = 2;

pub const MAX_TILE_ID: usize = 0x7FF;
pub const MAX_CHUNK_ID: usize = 0x3FFF;

fn check_len(what: &'static str, data: &[u8], unit: usize) -> Result<()> {
    if data.len() % unit == 0 {
        Ok(())
    } else {
        Err(Error::SizeMismatch {
            what,
            unit,
            len: data.len(),
        })
    }
}

fn words(data: &[u8]) -> impl Iterator<Item = u16> + '_ {
    data.chunks_exact(2).map(|w| u16::from_be_bytes([w[0], w[1]]))
}

pub fn decode_color(bytes: [u8; 2]) -> Color {
    Color {
        red: scale_color(bytes[1]),
        green: scale_color(bytes[1] >> 4),
        blue: scale_color(bytes[0]),
    }
}

pub fn encode_color(color: Color) -> [u8; 2] {
    [
        quantize_color(color.blue),
        quantize_color(color.green) << 4 | quantize_color(color.red),
    ]
}

/// Colors grouped into palettes of 16; a short final group is padded with black.
pub fn decode_palettes(data: &[u8]) -> Result<Vec<Palette>> {
    check_len("palette", data, COLOR_BYTES)?;
    let colors: Vec<Color> = data
        .chunks_exact(COLOR_BYTES)
        .map(|c| decode_color([c[0], c[1]]))
        .collect();
    Ok(colors
        .chunks(PALETTE_SIZE)
        .map(|group| {
            let mut pal = Palette::default();
            pal.colors[..group.len()].copy_from_slice(group);
            pal
        })
        .collect())
}

pub fn encode_palettes(palettes: &[Palette]) -> Vec<u8> {
    palettes
        .iter()
        .flat_map(|p| p.colors.iter())
        .flat_map(|&c| encode_color(c))
        .collect()
}

pub fn decode_tileset(data: &[u8]) -> Result<Tileset> {
    check_len("tileset", data, TILE_BYTES)?;
    let tiles = data
        .chunks_exact(TILE_BYTES)
        .map(|raw| {
            let mut tile = Tile::default();
            for y in 0..TILE_SIZE {
                for (i, &b) in raw[y * 4..y * 4 + 4].iter().enumerate() {
                    tile.pixels[y][i * 2] = b >> 4;
                    tile.pixels[y][i * 2 + 1] = b & 0xF;
                }
            }
            tile
        })
        .collect();
    Ok(Tileset { tiles })
}

pub fn encode_tileset(tileset: &Tileset) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(tileset.size() * TILE_BYTES);
    for tile in &tileset.tiles {
        tile.validate()?;
        for row in &tile.pixels {
            for pair in row.chunks_exact(2) {
                out.push(pair[0] << 4 | pair[1]);
            }
        }
    }
    Ok(out)
}

pub fn decode_chunk_cell(w: u16) -> ChunkTileRef {
    ChunkTileRef {
        priority: w >> 15 & 1 == 1,
        palette_index: (w >> 13 & 3) as u8,
        h_flip: w >> 12 & 1 == 1,
        v_flip: w >> 11 & 1 == 1,
        tile_id: w & MAX_TILE_ID as u16,
    }
}

pub fn encode_chunk_cell(cell: ChunkTileRef) -> Result<u16> {
    check_index("tile id", cell.tile_id as usize, MAX_TILE_ID + 1)?;
    check_index("palette index", cell.palette_index as usize, 4)?;
    Ok((cell.priority as u16) << 15
        | (cell.palette_index as u16) << 13
        | (cell.h_flip as u16) << 12
        | (cell.v_flip as u16) << 11
        | cell.tile_id)
}

/// The chunk size isn't stored in the stream, so the caller supplies it.
pub fn decode_chunkset(data: &[u8], chunk_size: usize) -> Result<Chunkset> {
    let cells_per_chunk = chunk_size * chunk_size;
    check_len("chunkset", data, CELL_BYTES)?;
    if cells_per_chunk == 0 {
        return Err(Error::SizeMismatch {
            what: "chunkset",
            unit: 0,
            len: data.len(),
        });
    }
    check_len("chunkset", data, CELL_BYTES * cells_per_chunk)?;
    let cells: Vec<ChunkTileRef> = words(data).map(decode_chunk_cell).collect();
    let chunks = cells
        .chunks(cells_per_chunk)
        .map(|c| Chunk {
            cells: c.chunks(chunk_size).map(<[_]>::to_vec).collect(),
        })
        .collect();
    Ok(Chunkset { chunk_size, chunks })
}

pub fn encode_chunkset(chunkset: &Chunkset) -> Result<Vec<u8>> {
    let mut out = vec![];
    for cell in chunkset.chunks.iter().flat_map(|c| c.cells.iter().flatten()) {
        out.extend(encode_chunk_cell(*cell)?.to_be_bytes());
    }
    Ok(out)
}

pub fn decode_map_cell(w: u16) -> MapChunkRef {
    MapChunkRef {
        h_flip: w >> 15 & 1 == 1,
        v_flip: w >> 14 & 1 == 1,
        chunk_id: w & MAX_CHUNK_ID as u16,
    }
}

pub fn encode_map_cell(cell: MapChunkRef) -> Result<u16> {
    check_index("chunk id", cell.chunk_id as usize, MAX_CHUNK_ID + 1)?;
    Ok((cell.h_flip as u16) << 15 | (cell.v_flip as u16) << 14 | cell.chunk_id)
}

/// Map cells in row-major order; the map dimensions come from the caller.
pub fn decode_tilemap(data: &[u8], width: usize, height: usize) -> Result<Tilemap> {
    let expected = width * height * CELL_BYTES;
    if data.len() != expected || expected == 0 {
        return Err(Error::SizeMismatch {
            what: "tilemap",
            unit: expected,
            len: data.len(),
        });
    }
    let cells: Vec<MapChunkRef> = words(data).map(decode_map_cell).collect();
    Ok(Tilemap {
        width,
        height,
        cells: cells.chunks(width).map(<[_]>::to_vec).collect(),
    })
}

pub fn encode_tilemap(tilemap: &Tilemap) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(tilemap.width * tilemap.height * CELL_BYTES);
    for cell in tilemap.cells.iter().flatten() {
        out.extend(encode_map_cell(*cell)?.to_be_bytes());
    }
    Ok(out)
}
