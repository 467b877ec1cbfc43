// Project file (.tge) JSON layout:
//
//   { "palettes": [[[r,g,b] x16] x4],
//     "tileset":  { "size": n, "set": [tile 8x8 index grid, ...] },
//     "chunkset": { "size": n, "chunkSize": s, "set": [s x s grid of cells, ...] },
//     "tilemap":  { "size": [w, h], "map": [h rows of w cells] } }
//
// Cells are written as named records. Older files stored them as positional
// tuples, which are still accepted on load.
use json_pretty_compact::PrettyCompactFormatter;
use serde::{Deserialize, Serialize};
use serde_json::Serializer;

use crate::{
    common::{
        Chunk, ChunkId, ChunkTileRef, Chunkset, MapChunkRef, Palette, PaletteIdx, Tile, TileId,
        Tilemap, Tileset, PALETTE_COUNT,
    },
    error::{Error, Result},
    state::ProjectData,
};

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ChunkTileRefRepr {
    #[serde(rename_all = "camelCase")]
    Record {
        tile_id: TileId,
        palette_index: PaletteIdx,
        #[serde(default)]
        priority: bool,
        #[serde(default)]
        h_flip: bool,
        #[serde(default)]
        v_flip: bool,
    },
    Tuple(PaletteIdx, TileId, bool, bool, bool),
}

impl From<ChunkTileRefRepr> for ChunkTileRef {
    fn from(repr: ChunkTileRefRepr) -> Self {
        match repr {
            ChunkTileRefRepr::Record {
                tile_id,
                palette_index,
                priority,
                h_flip,
                v_flip,
            }
            | ChunkTileRefRepr::Tuple(palette_index, tile_id, priority, h_flip, v_flip) => {
                ChunkTileRef {
                    tile_id,
                    palette_index,
                    priority,
                    h_flip,
                    v_flip,
                }
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum MapChunkRefRepr {
    #[serde(rename_all = "camelCase")]
    Record {
        chunk_id: ChunkId,
        #[serde(default)]
        h_flip: bool,
        #[serde(default)]
        v_flip: bool,
    },
    Tuple(ChunkId, bool, bool),
}

impl From<MapChunkRefRepr> for MapChunkRef {
    fn from(repr: MapChunkRefRepr) -> Self {
        match repr {
            MapChunkRefRepr::Record {
                chunk_id,
                h_flip,
                v_flip,
            }
            | MapChunkRefRepr::Tuple(chunk_id, h_flip, v_flip) => MapChunkRef {
                chunk_id,
                h_flip,
                v_flip,
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct TilesetFile<T> {
    size: usize,
    set: T,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunksetFile<T> {
    size: usize,
    chunk_size: usize,
    set: T,
}

#[derive(Serialize, Deserialize)]
struct TilemapFile<T> {
    size: (usize, usize),
    map: T,
}

#[derive(Serialize, Deserialize)]
struct ProjectFile<P, T, C, M> {
    palettes: P,
    tileset: TilesetFile<T>,
    chunkset: ChunksetFile<C>,
    tilemap: TilemapFile<M>,
}

type ProjectFileIn = ProjectFile<
    [Palette; PALETTE_COUNT],
    Vec<Tile>,
    Vec<Vec<Vec<ChunkTileRef>>>,
    Vec<Vec<MapChunkRef>>,
>;

fn mismatch(msg: String) -> Error {
    Error::SchemaMismatch(msg)
}

pub fn project_to_json(project: &ProjectData) -> Result<Vec<u8>> {
    let chunks: Vec<&Vec<Vec<ChunkTileRef>>> =
        project.chunkset.chunks.iter().map(|c| &c.cells).collect();
    let file = ProjectFile {
        palettes: &project.palettes,
        tileset: TilesetFile {
            size: project.tileset.size(),
            set: &project.tileset.tiles,
        },
        chunkset: ChunksetFile {
            size: project.chunkset.size(),
            chunk_size: project.chunkset.chunk_size,
            set: chunks,
        },
        tilemap: TilemapFile {
            size: (project.tilemap.width, project.tilemap.height),
            map: &project.tilemap.cells,
        },
    };
    let mut data = vec![];
    let mut ser = Serializer::with_formatter(&mut data, PrettyCompactFormatter::new());
    file.serialize(&mut ser)
        .map_err(|e| mismatch(e.to_string()))?;
    Ok(data)
}

/// Parse and fully validate a project; nothing is returned unless all of it checks out.
pub fn project_from_json(data: &[u8]) -> Result<ProjectData> {
    let file: ProjectFileIn = serde_json::from_slice(data).map_err(|e| mismatch(e.to_string()))?;

    if file.tileset.size != file.tileset.set.len() {
        return Err(mismatch(format!(
            "tileset size {} but {} tiles",
            file.tileset.size,
            file.tileset.set.len()
        )));
    }
    if file.chunkset.size != file.chunkset.set.len() {
        return Err(mismatch(format!(
            "chunkset size {} but {} chunks",
            file.chunkset.size,
            file.chunkset.set.len()
        )));
    }
    let (width, height) = file.tilemap.size;

    let project = ProjectData {
        palettes: file.palettes,
        tileset: Tileset {
            tiles: file.tileset.set,
        },
        chunkset: Chunkset {
            chunk_size: file.chunkset.chunk_size,
            chunks: file
                .chunkset
                .set
                .into_iter()
                .map(|cells| Chunk { cells })
                .collect(),
        },
        tilemap: Tilemap {
            width,
            height,
            cells: file.tilemap.map,
        },
    };
    project.validate()?;
    Ok(project)
}
