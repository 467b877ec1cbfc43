use serde::{Deserialize, Serialize};

use crate::{
    codec::project::{ChunkTileRefRepr, MapChunkRefRepr},
    error::{check_index, Error, Result},
    helpers::pack_argb,
};

pub type ColorValue = u8; // Color channel value (0-255)
pub type ColorIdx = u8; // Index into 4bpp palette (0-15)
pub type PaletteIdx = u8; // Index into the project's palette slots (0-3)
pub type TileId = u16; // Index into the tileset
pub type ChunkId = u16; // Index into the chunkset
pub type PixelCoord = usize; // Pixel position within a tile (0-7)
pub type CellCoord = usize; // Cell position within a chunk or the tilemap

pub const TILE_SIZE: usize = 8;
pub const PALETTE_SIZE: usize = 16;
pub const PALETTE_COUNT: usize = 4;

// Cell grids are public, so rows may be ragged; every access checks the row it lands in.
fn grid_get<T: Copy>(cells: &[Vec<T>], x: CellCoord, y: CellCoord) -> Result<T> {
    let row = &cells[check_index("cell row", y, cells.len())?];
    Ok(row[check_index("cell column", x, row.len())?])
}

fn grid_get_mut<T>(cells: &mut [Vec<T>], x: CellCoord, y: CellCoord) -> Result<&mut T> {
    let len = cells.len();
    let row = &mut cells[check_index("cell row", y, len)?];
    let len = row.len();
    Ok(&mut row[check_index("cell column", x, len)?])
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[ColorValue; 3]", into = "[ColorValue; 3]")]
pub struct Color {
    pub red: ColorValue,
    pub green: ColorValue,
    pub blue: ColorValue,
}

impl Color {
    pub const fn new(red: ColorValue, green: ColorValue, blue: ColorValue) -> Self {
        Color { red, green, blue }
    }
}

impl From<[ColorValue; 3]> for Color {
    fn from([red, green, blue]: [ColorValue; 3]) -> Self {
        Color { red, green, blue }
    }
}

impl From<Color> for [ColorValue; 3] {
    fn from(c: Color) -> Self {
        [c.red, c.green, c.blue]
    }
}

/// Sixteen colors; index 0 always renders transparent.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    pub colors: [Color; PALETTE_SIZE],
}

impl Palette {
    pub fn new(colors: [Color; PALETTE_SIZE]) -> Self {
        Palette { colors }
    }

    pub fn get_color(&self, idx: usize) -> Result<Color> {
        Ok(self.colors[check_index("color index", idx, PALETTE_SIZE)?])
    }

    pub fn set_color(&mut self, idx: usize, color: Color) -> Result<()> {
        self.colors[check_index("color index", idx, PALETTE_SIZE)?] = color;
        Ok(())
    }

    /// Packed ARGB for each color index, with entry 0 fully transparent.
    pub fn argb_lookup(&self) -> [u32; PALETTE_SIZE] {
        let mut lookup = [0; PALETTE_SIZE];
        for (i, &c) in self.colors.iter().enumerate() {
            lookup[i] = pack_argb(if i == 0 { 0 } else { 255 }, c);
        }
        lookup
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    pub fn from_flags(h_flip: bool, v_flip: bool) -> Self {
        match (h_flip, v_flip) {
            (false, false) => Flip::None,
            (true, false) => Flip::Horizontal,
            (false, true) => Flip::Vertical,
            (true, true) => Flip::Both,
        }
    }

    pub fn h(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    pub fn v(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }

    /// Position in an unflipped `n`x`n` grid that ends up at (x, y) once flipped.
    pub fn source(self, x: usize, y: usize, n: usize) -> (usize, usize) {
        let sx = if self.h() { n - 1 - x } else { x };
        let sy = if self.v() { n - 1 - y } else { y };
        (sx, sy)
    }

    pub fn apply_to_pixels(self, pixels: [[ColorIdx; 8]; 8]) -> [[ColorIdx; 8]; 8] {
        let mut out = [[0; 8]; 8];
        for y in 0..TILE_SIZE {
            for x in 0..TILE_SIZE {
                let (sx, sy) = self.source(x, y, TILE_SIZE);
                out[y][x] = pixels[sy][sx];
            }
        }
        out
    }

    pub fn apply_to_tile(self, tile: Tile) -> Tile {
        Tile {
            pixels: self.apply_to_pixels(tile.pixels),
        }
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tile {
    pub pixels: [[ColorIdx; TILE_SIZE]; TILE_SIZE],
}

impl Tile {
    pub fn get_pixel(&self, x: PixelCoord, y: PixelCoord) -> Result<ColorIdx> {
        check_index("pixel x", x, TILE_SIZE)?;
        check_index("pixel y", y, TILE_SIZE)?;
        Ok(self.pixels[y][x])
    }

    pub fn set_pixel(&mut self, x: PixelCoord, y: PixelCoord, color_idx: ColorIdx) -> Result<()> {
        check_index("pixel x", x, TILE_SIZE)?;
        check_index("pixel y", y, TILE_SIZE)?;
        check_index("color index", color_idx as usize, PALETTE_SIZE)?;
        self.pixels[y][x] = color_idx;
        Ok(())
    }

    /// A flipped copy; the tile itself is shared by every placement and stays as is.
    pub fn flipped(&self, h_flip: bool, v_flip: bool) -> Tile {
        Flip::from_flags(h_flip, v_flip).apply_to_tile(*self)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for row in &self.pixels {
            for &c in row {
                check_index("color index", c as usize, PALETTE_SIZE)?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tileset {
    pub tiles: Vec<Tile>,
}

impl Tileset {
    pub fn new(size: usize) -> Self {
        Tileset {
            tiles: vec![Tile::default(); size],
        }
    }

    pub fn size(&self) -> usize {
        self.tiles.len()
    }

    pub fn get(&self, id: TileId) -> Result<&Tile> {
        Ok(&self.tiles[check_index("tile id", id as usize, self.tiles.len())?])
    }

    pub fn get_mut(&mut self, id: TileId) -> Result<&mut Tile> {
        let idx = check_index("tile id", id as usize, self.tiles.len())?;
        Ok(&mut self.tiles[idx])
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ChunkTileRefRepr")]
pub struct ChunkTileRef {
    pub tile_id: TileId,
    pub palette_index: PaletteIdx,
    pub priority: bool,
    pub h_flip: bool,
    pub v_flip: bool,
}

impl ChunkTileRef {
    pub fn new(palette_index: PaletteIdx, tile_id: TileId) -> Self {
        ChunkTileRef {
            tile_id,
            palette_index,
            ..Default::default()
        }
    }

    pub fn flip(&self) -> Flip {
        Flip::from_flags(self.h_flip, self.v_flip)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub cells: Vec<Vec<ChunkTileRef>>,
}

impl Chunk {
    pub fn new(chunk_size: usize) -> Self {
        Chunk {
            cells: vec![vec![ChunkTileRef::default(); chunk_size]; chunk_size],
        }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, x: CellCoord, y: CellCoord) -> Result<ChunkTileRef> {
        let n = self.size();
        check_index("chunk cell x", x, n)?;
        check_index("chunk cell y", y, n)?;
        grid_get(&self.cells, x, y)
    }

    /// The cell shown at (x, y) when the whole chunk is placed with `flip`.
    /// Reads through the flip instead of reordering the stored grid.
    pub fn cell_at(&self, x: CellCoord, y: CellCoord, flip: Flip) -> Result<ChunkTileRef> {
        let n = self.size();
        check_index("chunk cell x", x, n)?;
        check_index("chunk cell y", y, n)?;
        let (sx, sy) = flip.source(x, y, n);
        grid_get(&self.cells, sx, sy)
    }

    pub fn references_tile(&self, tile_id: TileId) -> bool {
        self.cells.iter().flatten().any(|c| c.tile_id == tile_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunkset {
    pub chunk_size: usize,
    pub chunks: Vec<Chunk>,
}

impl Chunkset {
    pub fn new(size: usize, chunk_size: usize) -> Self {
        Chunkset {
            chunk_size,
            chunks: vec![Chunk::new(chunk_size); size],
        }
    }

    pub fn size(&self) -> usize {
        self.chunks.len()
    }

    pub fn get(&self, id: ChunkId) -> Result<&Chunk> {
        Ok(&self.chunks[check_index("chunk id", id as usize, self.chunks.len())?])
    }

    pub fn set_cell(
        &mut self,
        chunk_id: ChunkId,
        x: CellCoord,
        y: CellCoord,
        cell: ChunkTileRef,
        tileset: &Tileset,
    ) -> Result<()> {
        check_index("tile id", cell.tile_id as usize, tileset.size())?;
        check_index("palette index", cell.palette_index as usize, PALETTE_COUNT)?;
        let idx = check_index("chunk id", chunk_id as usize, self.chunks.len())?;
        let n = self.chunk_size;
        check_index("chunk cell x", x, n)?;
        check_index("chunk cell y", y, n)?;
        *grid_get_mut(&mut self.chunks[idx].cells, x, y)? = cell;
        Ok(())
    }

    /// Checks chunk shapes and every cell reference against `tile_count`.
    pub fn validate(&self, tile_count: usize) -> Result<()> {
        for chunk in &self.chunks {
            if chunk.size() != self.chunk_size
                || chunk.cells.iter().any(|row| row.len() != self.chunk_size)
            {
                return Err(Error::SchemaMismatch(format!(
                    "chunk is not {0}x{0}",
                    self.chunk_size
                )));
            }
            for cell in chunk.cells.iter().flatten() {
                check_index("tile id", cell.tile_id as usize, tile_count)?;
                check_index("palette index", cell.palette_index as usize, PALETTE_COUNT)?;
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "MapChunkRefRepr")]
pub struct MapChunkRef {
    pub chunk_id: ChunkId,
    pub h_flip: bool,
    pub v_flip: bool,
}

impl MapChunkRef {
    pub fn new(chunk_id: ChunkId) -> Self {
        MapChunkRef {
            chunk_id,
            ..Default::default()
        }
    }

    pub fn flip(&self) -> Flip {
        Flip::from_flags(self.h_flip, self.v_flip)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Vec<MapChunkRef>>, // row-major, `height` rows of `width`
}

impl Tilemap {
    pub fn new(width: usize, height: usize) -> Self {
        Tilemap {
            width,
            height,
            cells: vec![vec![MapChunkRef::default(); width]; height],
        }
    }

    pub fn get(&self, x: CellCoord, y: CellCoord) -> Result<MapChunkRef> {
        check_index("map x", x, self.width)?;
        check_index("map y", y, self.height)?;
        grid_get(&self.cells, x, y)
    }

    pub fn set_cell(
        &mut self,
        x: CellCoord,
        y: CellCoord,
        cell: MapChunkRef,
        chunkset: &Chunkset,
    ) -> Result<()> {
        check_index("map x", x, self.width)?;
        check_index("map y", y, self.height)?;
        check_index("chunk id", cell.chunk_id as usize, chunkset.size())?;
        *grid_get_mut(&mut self.cells, x, y)? = cell;
        Ok(())
    }

    pub fn validate(&self, chunk_count: usize) -> Result<()> {
        if self.cells.len() != self.height || self.cells.iter().any(|row| row.len() != self.width)
        {
            return Err(Error::SchemaMismatch(format!(
                "tilemap is not {}x{}",
                self.width, self.height
            )));
        }
        for cell in self.cells.iter().flatten() {
            check_index("chunk id", cell.chunk_id as usize, chunk_count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_bounds() {
        let mut pal = Palette::default();
        pal.set_color(15, Color::new(1, 2, 3)).unwrap();
        assert_eq!(pal.get_color(15).unwrap(), Color::new(1, 2, 3));
        assert!(matches!(
            pal.set_color(16, Color::default()),
            Err(Error::IndexOutOfRange { index: 16, .. })
        ));
        assert!(pal.get_color(16).is_err());
    }

    #[test]
    fn index_zero_is_transparent() {
        let pal = Palette::new([Color::new(255, 255, 255); 16]);
        let lookup = pal.argb_lookup();
        assert_eq!(lookup[0] >> 24, 0);
        assert_eq!(lookup[1], 0xFFFF_FFFF);
    }

    #[test]
    fn tile_pixel_bounds() {
        let mut tile = Tile::default();
        tile.set_pixel(7, 0, 15).unwrap();
        assert_eq!(tile.get_pixel(7, 0).unwrap(), 15);
        assert!(tile.set_pixel(8, 0, 1).is_err());
        assert!(tile.set_pixel(0, 8, 1).is_err());
        assert!(tile.set_pixel(0, 0, 16).is_err());
    }

    #[test]
    fn flipped_leaves_source_alone() {
        let mut tile = Tile::default();
        tile.set_pixel(0, 0, 3).unwrap();
        tile.set_pixel(1, 0, 4).unwrap();
        let before = tile;

        let h = tile.flipped(true, false);
        assert_eq!(h.pixels[0][7], 3);
        assert_eq!(h.pixels[0][6], 4);
        let v = tile.flipped(false, true);
        assert_eq!(v.pixels[7][0], 3);
        let hv = tile.flipped(true, true);
        assert_eq!(hv.pixels[7][7], 3);

        assert_eq!(tile, before);
    }

    #[test]
    fn chunk_cell_at_reads_through_flip() {
        let mut chunk = Chunk::new(2);
        chunk.cells[0][0] = ChunkTileRef::new(0, 1);
        assert_eq!(chunk.cell_at(1, 0, Flip::Horizontal).unwrap().tile_id, 1);
        assert_eq!(chunk.cell_at(0, 1, Flip::Vertical).unwrap().tile_id, 1);
        assert_eq!(chunk.cell_at(1, 1, Flip::Both).unwrap().tile_id, 1);
        assert_eq!(chunk.cells[0][0].tile_id, 1);
        assert!(chunk.cell_at(2, 0, Flip::None).is_err());
    }

    #[test]
    fn ragged_grids_report_errors() {
        let mut chunk = Chunk::new(2);
        chunk.cells[1].truncate(1);
        assert!(chunk.get(0, 1).is_ok());
        assert!(matches!(
            chunk.get(1, 1),
            Err(Error::IndexOutOfRange { index: 1, len: 1, .. })
        ));
        assert!(chunk.cell_at(0, 1, Flip::Horizontal).is_err());

        let mut chunkset = Chunkset::new(1, 2);
        chunkset.chunks[0] = chunk;
        let tileset = Tileset::new(1);
        assert!(chunkset
            .set_cell(0, 1, 1, ChunkTileRef::new(0, 0), &tileset)
            .is_err());

        let mut map = Tilemap::new(2, 2);
        map.cells.pop();
        assert!(map.get(0, 1).is_err());
        assert!(map.set_cell(0, 1, MapChunkRef::new(0), &chunkset).is_err());
    }

    #[test]
    fn set_cell_checks_references() {
        let tileset = Tileset::new(2);
        let mut chunkset = Chunkset::new(1, 2);
        chunkset
            .set_cell(0, 1, 1, ChunkTileRef::new(3, 1), &tileset)
            .unwrap();
        assert!(chunkset
            .set_cell(0, 0, 0, ChunkTileRef::new(0, 2), &tileset)
            .is_err());
        assert!(chunkset
            .set_cell(0, 0, 0, ChunkTileRef::new(4, 0), &tileset)
            .is_err());
        assert!(chunkset
            .set_cell(1, 0, 0, ChunkTileRef::new(0, 0), &tileset)
            .is_err());
        assert!(chunkset
            .set_cell(0, 2, 0, ChunkTileRef::new(0, 0), &tileset)
            .is_err());

        let mut map = Tilemap::new(3, 2);
        map.set_cell(2, 1, MapChunkRef::new(0), &chunkset).unwrap();
        assert!(map.set_cell(3, 0, MapChunkRef::new(0), &chunkset).is_err());
        assert!(map.set_cell(0, 0, MapChunkRef::new(1), &chunkset).is_err());
    }
}
