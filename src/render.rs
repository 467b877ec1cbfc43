// Compositing of palettes, tiles, chunks and the tilemap into ARGB pixel buffers.
//
// Flips are resolved by reading the canonical storage through `Flip::source`;
// nothing in here writes to a tile, chunk or palette.
use crate::{
    common::{
        CellCoord, Chunk, Chunkset, Flip, Palette, Tile, Tilemap, Tileset, PALETTE_SIZE, TILE_SIZE,
    },
    error::{check_index, Result},
    helpers::argb_to_rgba,
};

/// Row-major buffer of packed ARGB pixels. Starts fully transparent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        PixelBuffer {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Result<u32> {
        check_index("buffer x", x, self.width)?;
        check_index("buffer y", y, self.height)?;
        Ok(self.pixels[y * self.width + x])
    }

    pub fn put(&mut self, x: usize, y: usize, argb: u32) -> Result<()> {
        check_index("buffer x", x, self.width)?;
        check_index("buffer y", y, self.height)?;
        self.pixels[y * self.width + x] = argb;
        Ok(())
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&p| argb_to_rgba(p)).collect()
    }
}

fn palette_lookups(palettes: &[Palette]) -> Vec<[u32; PALETTE_SIZE]> {
    palettes.iter().map(Palette::argb_lookup).collect()
}

/// Paint an 8x8 tile at pixel position (x0, y0) using a prepared lookup.
pub fn draw_tile(
    buf: &mut PixelBuffer,
    x0: usize,
    y0: usize,
    tile: &Tile,
    lookup: &[u32; PALETTE_SIZE],
    flip: Flip,
) -> Result<()> {
    check_index("tile right edge", x0 + TILE_SIZE, buf.width + 1)?;
    check_index("tile bottom edge", y0 + TILE_SIZE, buf.height + 1)?;
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            let (sx, sy) = flip.source(x, y, TILE_SIZE);
            let c = tile.pixels[sy][sx] as usize;
            let argb = lookup[check_index("color index", c, PALETTE_SIZE)?];
            buf.pixels[(y0 + y) * buf.width + x0 + x] = argb;
        }
    }
    Ok(())
}

pub fn render_tile(
    tile: &Tile,
    palette: &Palette,
    h_flip: bool,
    v_flip: bool,
) -> Result<PixelBuffer> {
    let mut buf = PixelBuffer::new(TILE_SIZE, TILE_SIZE);
    draw_tile(
        &mut buf,
        0,
        0,
        tile,
        &palette.argb_lookup(),
        Flip::from_flags(h_flip, v_flip),
    )?;
    Ok(buf)
}

fn draw_chunk_with(
    buf: &mut PixelBuffer,
    x0: usize,
    y0: usize,
    chunk: &Chunk,
    tileset: &Tileset,
    lookups: &[[u32; PALETTE_SIZE]],
    flip: Flip,
) -> Result<()> {
    let n = chunk.size();
    for cy in 0..n {
        for cx in 0..n {
            // Chunk-level flip picks which cell lands here; the cell's own
            // flip then applies to that tile's pixels.
            let cell = chunk.cell_at(cx, cy, flip)?;
            let tile = tileset.get(cell.tile_id)?;
            let lookup = &lookups[check_index(
                "palette index",
                cell.palette_index as usize,
                lookups.len(),
            )?];
            draw_tile(
                buf,
                x0 + cx * TILE_SIZE,
                y0 + cy * TILE_SIZE,
                tile,
                lookup,
                cell.flip(),
            )?;
        }
    }
    Ok(())
}

/// Paint a whole chunk at pixel position (x0, y0).
pub fn draw_chunk(
    buf: &mut PixelBuffer,
    x0: usize,
    y0: usize,
    chunk: &Chunk,
    tileset: &Tileset,
    palettes: &[Palette],
    flip: Flip,
) -> Result<()> {
    draw_chunk_with(buf, x0, y0, chunk, tileset, &palette_lookups(palettes), flip)
}

/// Paint a single cell of a chunk (as placed with `flip`) at pixel position (x0, y0).
pub fn draw_chunk_cell(
    buf: &mut PixelBuffer,
    x0: usize,
    y0: usize,
    chunk: &Chunk,
    cx: CellCoord,
    cy: CellCoord,
    tileset: &Tileset,
    palettes: &[Palette],
    flip: Flip,
) -> Result<()> {
    let cell = chunk.cell_at(cx, cy, flip)?;
    let palette = &palettes[check_index(
        "palette index",
        cell.palette_index as usize,
        palettes.len(),
    )?];
    draw_tile(
        buf,
        x0 + cx * TILE_SIZE,
        y0 + cy * TILE_SIZE,
        tileset.get(cell.tile_id)?,
        &palette.argb_lookup(),
        cell.flip(),
    )
}

pub fn render_chunk(
    chunk: &Chunk,
    tileset: &Tileset,
    palettes: &[Palette],
    h_flip: bool,
    v_flip: bool,
) -> Result<PixelBuffer> {
    let side = chunk.size() * TILE_SIZE;
    let mut buf = PixelBuffer::new(side, side);
    draw_chunk(
        &mut buf,
        0,
        0,
        chunk,
        tileset,
        palettes,
        Flip::from_flags(h_flip, v_flip),
    )?;
    Ok(buf)
}

/// Repaint the region of one tilemap cell in a buffer covering the whole map.
pub fn draw_map_cell(
    buf: &mut PixelBuffer,
    tilemap: &Tilemap,
    x: CellCoord,
    y: CellCoord,
    chunkset: &Chunkset,
    tileset: &Tileset,
    palettes: &[Palette],
) -> Result<()> {
    let cell = tilemap.get(x, y)?;
    let chunk = chunkset.get(cell.chunk_id)?;
    let side = chunkset.chunk_size * TILE_SIZE;
    draw_chunk(
        buf,
        x * side,
        y * side,
        chunk,
        tileset,
        palettes,
        cell.flip(),
    )
}

pub fn render_tilemap(
    tilemap: &Tilemap,
    chunkset: &Chunkset,
    tileset: &Tileset,
    palettes: &[Palette],
) -> Result<PixelBuffer> {
    let side = chunkset.chunk_size * TILE_SIZE;
    let mut buf = PixelBuffer::new(tilemap.width * side, tilemap.height * side);
    let lookups = palette_lookups(palettes);
    for y in 0..tilemap.height {
        for x in 0..tilemap.width {
            let cell = tilemap.get(x, y)?;
            let chunk = chunkset.get(cell.chunk_id)?;
            draw_chunk_with(
                &mut buf,
                x * side,
                y * side,
                chunk,
                tileset,
                &lookups,
                cell.flip(),
            )?;
        }
    }
    Ok(buf)
}

/// Pixel position of slot `idx` in a sheet `per_row` slots wide, each `side` pixels.
pub fn sheet_position(idx: usize, per_row: usize, side: usize) -> (usize, usize) {
    ((idx % per_row) * side, (idx / per_row) * side)
}

fn sheet_rows(count: usize, per_row: usize) -> usize {
    count.div_ceil(per_row).max(1)
}

/// All tiles laid out `tiles_per_row` wide under a single palette.
pub fn render_tileset_sheet(
    tileset: &Tileset,
    palette: &Palette,
    tiles_per_row: usize,
) -> Result<PixelBuffer> {
    let per_row = tiles_per_row.max(1);
    let mut buf = PixelBuffer::new(
        per_row * TILE_SIZE,
        sheet_rows(tileset.size(), per_row) * TILE_SIZE,
    );
    let lookup = palette.argb_lookup();
    for (i, tile) in tileset.tiles.iter().enumerate() {
        let (x0, y0) = sheet_position(i, per_row, TILE_SIZE);
        draw_tile(&mut buf, x0, y0, tile, &lookup, Flip::None)?;
    }
    Ok(buf)
}

/// All chunks laid out `chunks_per_row` wide, unflipped.
pub fn render_chunkset_sheet(
    chunkset: &Chunkset,
    tileset: &Tileset,
    palettes: &[Palette],
    chunks_per_row: usize,
) -> Result<PixelBuffer> {
    let per_row = chunks_per_row.max(1);
    let side = chunkset.chunk_size * TILE_SIZE;
    let mut buf = PixelBuffer::new(
        per_row * side,
        sheet_rows(chunkset.size(), per_row) * side,
    );
    let lookups = palette_lookups(palettes);
    for (i, chunk) in chunkset.chunks.iter().enumerate() {
        let (x0, y0) = sheet_position(i, per_row, side);
        draw_chunk_with(&mut buf, x0, y0, chunk, tileset, &lookups, Flip::None)?;
    }
    Ok(buf)
}
