// Palette and tileset extraction from indexed bitmaps.
use hashbrown::HashMap;

use crate::{
    common::{Color, Palette, Tile, Tileset, PALETTE_SIZE, TILE_SIZE},
    error::{check_index, Error, Result},
};

/// A decoded bitmap as a color table plus one table index per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: usize,
    pub height: usize,
    pub color_table: Vec<Color>,
    pub indices: Vec<u8>, // row-major, width * height
}

impl IndexedImage {
    /// Index an RGBA8 image by first appearance of each color. Fully
    /// transparent pixels share index 0, which is then reserved for them.
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Result<Self> {
        if rgba.len() != width * height * 4 {
            return Err(Error::SizeMismatch {
                what: "rgba image",
                unit: width * height * 4,
                len: rgba.len(),
            });
        }
        let mut color_table: Vec<Color> = vec![];
        let mut lookup: HashMap<Color, u8> = HashMap::new();
        if rgba.chunks_exact(4).any(|p| p[3] == 0) {
            color_table.push(Color::default());
        }
        let mut indices = Vec::with_capacity(width * height);
        for p in rgba.chunks_exact(4) {
            if p[3] == 0 {
                indices.push(0);
                continue;
            }
            let color = Color::new(p[0], p[1], p[2]);
            let idx = match lookup.get(&color) {
                Some(&idx) => idx,
                None => {
                    let idx = color_table.len();
                    color_table.push(color);
                    if idx >= PALETTE_SIZE {
                        // Keep counting so the error reports the real total.
                        lookup.insert(color, u8::MAX);
                        continue;
                    }
                    lookup.insert(color, idx as u8);
                    idx as u8
                }
            };
            indices.push(idx);
        }
        if color_table.len() > PALETTE_SIZE {
            return Err(Error::TooManyColors(color_table.len()));
        }
        Ok(IndexedImage {
            width,
            height,
            color_table,
            indices,
        })
    }

    fn check_shape(&self) -> Result<()> {
        if self.indices.len() != self.width * self.height {
            return Err(Error::SizeMismatch {
                what: "image pixel",
                unit: self.width * self.height,
                len: self.indices.len(),
            });
        }
        Ok(())
    }
}

/// The first 16 entries of the image's color table; shorter tables pad with black.
pub fn palette_from_image(image: &IndexedImage) -> Palette {
    let mut pal = Palette::default();
    for (dst, &src) in pal.colors.iter_mut().zip(&image.color_table) {
        *dst = src;
    }
    pal
}

/// Slice the image into 8x8 blocks, left to right then top to bottom.
pub fn tileset_from_image(image: &IndexedImage) -> Result<Tileset> {
    image.check_shape()?;
    for (what, len) in [("image width", image.width), ("image height", image.height)] {
        if len == 0 || len % TILE_SIZE != 0 {
            return Err(Error::SizeMismatch {
                what,
                unit: TILE_SIZE,
                len,
            });
        }
    }
    let cols = image.width / TILE_SIZE;
    let rows = image.height / TILE_SIZE;
    let mut tiles = Vec::with_capacity(cols * rows);
    for ty in 0..rows {
        for tx in 0..cols {
            let mut tile = Tile::default();
            for y in 0..TILE_SIZE {
                for x in 0..TILE_SIZE {
                    let px = (ty * TILE_SIZE + y) * image.width + tx * TILE_SIZE + x;
                    let c = image.indices[px];
                    check_index("color index", c as usize, PALETTE_SIZE)?;
                    tile.pixels[y][x] = c;
                }
            }
            tiles.push(tile);
        }
    }
    Ok(Tileset { tiles })
}
