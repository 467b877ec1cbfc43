use crate::{
    common::{ChunkId, Flip, TileId, PALETTE_COUNT, TILE_SIZE},
    error::{check_index, Result},
    message::Message,
    render::{draw_chunk_cell, draw_map_cell, render_tileset_sheet, sheet_position},
    state::{EditorState, ProjectData, Views, CHUNKSET_SHEET_COLUMNS, TILESET_SHEET_COLUMNS},
    undo::{get_undo_action, UndoAction},
};

/// Apply an editing message and record its inverse for undo.
///
/// On error the state, including its preview buffers and history, is left as it was.
pub fn update(state: &mut EditorState, message: Message) -> Result<()> {
    let action = get_undo_action(state, &message)?;
    apply(state, message)?;
    match action {
        UndoAction::None => {}
        UndoAction::Irreversible => {
            state.undo_stack.clear();
            state.redo_stack.clear();
        }
        UndoAction::Ok(inverse) => {
            state.undo_stack.push(inverse);
            state.redo_stack.clear();
        }
    }
    Ok(())
}

pub(crate) fn apply(state: &mut EditorState, message: Message) -> Result<()> {
    match message {
        Message::SetColor {
            palette,
            color_idx,
            color,
        } => {
            let slot = check_index("palette index", palette as usize, PALETTE_COUNT)?;
            restructure(state, |p| {
                p.palettes[slot].set_color(color_idx as usize, color)
            })?;
        }
        Message::SetPixel {
            tile_id,
            x,
            y,
            color_idx,
        } => {
            let sheet_slot =
                check_index("palette index", state.sheet_palette as usize, PALETTE_COUNT)?;
            state
                .project
                .tileset
                .get_mut(tile_id)?
                .set_pixel(x, y, color_idx)?;
            redraw_pixel(state, sheet_slot, tile_id, x, y)?;
        }
        Message::SetChunkCell {
            chunk_id,
            x,
            y,
            cell,
        } => {
            let project = &mut state.project;
            project
                .chunkset
                .set_cell(chunk_id, x, y, cell, &project.tileset)?;
            redraw_chunk_cell(state, chunk_id, x, y)?;
        }
        Message::SetMapCell { x, y, cell } => {
            let project = &mut state.project;
            project.tilemap.set_cell(x, y, cell, &project.chunkset)?;
            let project = &state.project;
            draw_map_cell(
                &mut state.views.tilemap,
                &project.tilemap,
                x,
                y,
                &project.chunkset,
                &project.tileset,
                &project.palettes,
            )?;
        }
        Message::ReplacePalette { slot, palette } => {
            let slot = check_index("palette index", slot as usize, PALETTE_COUNT)?;
            restructure(state, |p| {
                p.palettes[slot] = palette;
                Ok(())
            })?;
        }
        Message::ReplaceTileset(tileset) => {
            restructure(state, |p| {
                p.tileset = tileset;
                Ok(())
            })?;
        }
        Message::ReplaceChunkset(chunkset) => {
            restructure(state, |p| {
                p.chunkset = chunkset;
                Ok(())
            })?;
        }
        Message::ReplaceTilemap(tilemap) => {
            restructure(state, |p| {
                p.tilemap = tilemap;
                Ok(())
            })?;
        }
        Message::LoadProject(project) => {
            project.validate()?;
            let views = Views::render(&project, state.sheet_palette)?;
            state.project = *project;
            state.views = views;
        }
        Message::SelectSheetPalette(slot) => {
            let idx = check_index("palette index", slot as usize, PALETTE_COUNT)?;
            state.views.tileset_sheet = render_tileset_sheet(
                &state.project.tileset,
                &state.project.palettes[idx],
                TILESET_SHEET_COLUMNS,
            )?;
            state.sheet_palette = slot;
        }
    }
    Ok(())
}

/// Structural change: edit a copy, check it, render everything, then swap it in.
fn restructure(
    state: &mut EditorState,
    edit: impl FnOnce(&mut ProjectData) -> Result<()>,
) -> Result<()> {
    let mut project = state.project.clone();
    edit(&mut project)?;
    project.validate()?;
    let views = Views::render(&project, state.sheet_palette)?;
    state.project = project;
    state.views = views;
    Ok(())
}

fn redraw_map_cells(
    state: &mut EditorState,
    mut affected: impl FnMut(ChunkId) -> bool,
) -> Result<()> {
    let project = &state.project;
    let tilemap = &project.tilemap;
    for y in 0..tilemap.height {
        for x in 0..tilemap.width {
            if affected(tilemap.get(x, y)?.chunk_id) {
                draw_map_cell(
                    &mut state.views.tilemap,
                    tilemap,
                    x,
                    y,
                    &project.chunkset,
                    &project.tileset,
                    &project.palettes,
                )?;
            }
        }
    }
    Ok(())
}

fn redraw_pixel(
    state: &mut EditorState,
    sheet_slot: usize,
    tile_id: TileId,
    x: usize,
    y: usize,
) -> Result<()> {
    let project = &state.project;
    let views = &mut state.views;

    let lookup = project.palettes[sheet_slot].argb_lookup();
    let c = project.tileset.get(tile_id)?.get_pixel(x, y)?;
    let (x0, y0) = sheet_position(tile_id as usize, TILESET_SHEET_COLUMNS, TILE_SIZE);
    views
        .tileset_sheet
        .put(x0 + x, y0 + y, lookup[c as usize])?;

    let side = project.chunkset.chunk_size * TILE_SIZE;
    for (i, chunk) in project.chunkset.chunks.iter().enumerate() {
        let (cx0, cy0) = sheet_position(i, CHUNKSET_SHEET_COLUMNS, side);
        for (cy, row) in chunk.cells.iter().enumerate() {
            for (cx, cell) in row.iter().enumerate() {
                if cell.tile_id == tile_id {
                    draw_chunk_cell(
                        &mut views.chunkset_sheet,
                        cx0,
                        cy0,
                        chunk,
                        cx,
                        cy,
                        &project.tileset,
                        &project.palettes,
                        Flip::None,
                    )?;
                }
            }
        }
    }

    let hits: Vec<bool> = project
        .chunkset
        .chunks
        .iter()
        .map(|c| c.references_tile(tile_id))
        .collect();
    redraw_map_cells(state, |chunk_id| {
        hits.get(chunk_id as usize).copied().unwrap_or(false)
    })
}

fn redraw_chunk_cell(state: &mut EditorState, chunk_id: ChunkId, x: usize, y: usize) -> Result<()> {
    let project = &state.project;
    let side = project.chunkset.chunk_size * TILE_SIZE;
    let (x0, y0) = sheet_position(chunk_id as usize, CHUNKSET_SHEET_COLUMNS, side);
    draw_chunk_cell(
        &mut state.views.chunkset_sheet,
        x0,
        y0,
        project.chunkset.get(chunk_id)?,
        x,
        y,
        &project.tileset,
        &project.palettes,
        Flip::None,
    )?;
    redraw_map_cells(state, |id| id == chunk_id)
}
