use crate::{
    common::{
        CellCoord, ChunkId, ChunkTileRef, Chunkset, Color, ColorIdx, MapChunkRef, Palette,
        PaletteIdx, PixelCoord, TileId, Tilemap, Tileset,
    },
    state::ProjectData,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    SetColor {
        palette: PaletteIdx,
        color_idx: ColorIdx,
        color: Color,
    },
    SetPixel {
        tile_id: TileId,
        x: PixelCoord,
        y: PixelCoord,
        color_idx: ColorIdx,
    },
    SetChunkCell {
        chunk_id: ChunkId,
        x: CellCoord,
        y: CellCoord,
        cell: ChunkTileRef,
    },
    SetMapCell {
        x: CellCoord,
        y: CellCoord,
        cell: MapChunkRef,
    },
    ReplacePalette {
        slot: PaletteIdx,
        palette: Palette,
    },
    ReplaceTileset(Tileset),
    ReplaceChunkset(Chunkset),
    ReplaceTilemap(Tilemap),
    LoadProject(Box<ProjectData>),
    SelectSheetPalette(PaletteIdx),
}
