use crate::{
    common::PALETTE_COUNT,
    error::{check_index, Result},
    message::Message,
    state::EditorState,
    update::apply,
};

#[derive(Debug)]
pub enum UndoAction {
    None,
    Irreversible,
    Ok(Message),
}

/// The message that reverts `message`, computed against the state before it is applied.
pub fn get_undo_action(state: &EditorState, message: &Message) -> Result<UndoAction> {
    let project = &state.project;
    let action = match message {
        &Message::SetColor {
            palette,
            color_idx,
            color: _,
        } => {
            let slot = check_index("palette index", palette as usize, PALETTE_COUNT)?;
            UndoAction::Ok(Message::SetColor {
                palette,
                color_idx,
                color: project.palettes[slot].get_color(color_idx as usize)?,
            })
        }
        &Message::SetPixel {
            tile_id,
            x,
            y,
            color_idx: _,
        } => UndoAction::Ok(Message::SetPixel {
            tile_id,
            x,
            y,
            color_idx: project.tileset.get(tile_id)?.get_pixel(x, y)?,
        }),
        &Message::SetChunkCell {
            chunk_id, x, y, ..
        } => UndoAction::Ok(Message::SetChunkCell {
            chunk_id,
            x,
            y,
            cell: project.chunkset.get(chunk_id)?.get(x, y)?,
        }),
        &Message::SetMapCell { x, y, .. } => UndoAction::Ok(Message::SetMapCell {
            x,
            y,
            cell: project.tilemap.get(x, y)?,
        }),
        &Message::ReplacePalette { slot, .. } => {
            let idx = check_index("palette index", slot as usize, PALETTE_COUNT)?;
            UndoAction::Ok(Message::ReplacePalette {
                slot,
                palette: project.palettes[idx],
            })
        }
        Message::ReplaceTileset(_) => {
            UndoAction::Ok(Message::ReplaceTileset(project.tileset.clone()))
        }
        Message::ReplaceChunkset(_) => {
            UndoAction::Ok(Message::ReplaceChunkset(project.chunkset.clone()))
        }
        Message::ReplaceTilemap(_) => {
            UndoAction::Ok(Message::ReplaceTilemap(project.tilemap.clone()))
        }
        Message::LoadProject(_) => UndoAction::Irreversible,
        Message::SelectSheetPalette(_) => UndoAction::None,
    };
    Ok(action)
}

impl EditorState {
    /// Revert the most recent edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(inverse) = self.undo_stack.last().cloned() else {
            return Ok(false);
        };
        let redo = get_undo_action(self, &inverse)?;
        apply(self, inverse)?;
        self.undo_stack.pop();
        if let UndoAction::Ok(msg) = redo {
            self.redo_stack.push(msg);
        }
        Ok(true)
    }

    /// Re-apply the most recently undone edit. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(forward) = self.redo_stack.last().cloned() else {
            return Ok(false);
        };
        let undo = get_undo_action(self, &forward)?;
        apply(self, forward)?;
        self.redo_stack.pop();
        if let UndoAction::Ok(msg) = undo {
            self.undo_stack.push(msg);
        }
        Ok(true)
    }
}
