use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    common::{Chunkset, Palette, PaletteIdx, Tilemap, Tileset, PALETTE_COUNT},
    error::{check_index, Error, Result},
    message::Message,
    render::{render_chunkset_sheet, render_tilemap, render_tileset_sheet, PixelBuffer},
};

pub const TILESET_SHEET_COLUMNS: usize = 16;
pub const CHUNKSET_SHEET_COLUMNS: usize = 8;

/// Capacities fixed when a project is created.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub tileset_size: usize,
    pub chunkset_size: usize,
    pub chunk_size: usize,
    pub tilemap_width: usize,
    pub tilemap_height: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            tileset_size: 1600,
            chunkset_size: 400,
            chunk_size: 4,
            tilemap_width: 64,
            tilemap_height: 32,
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tileset size", self.tileset_size),
            ("chunkset size", self.chunkset_size),
            ("chunk size", self.chunk_size),
            ("tilemap width", self.tilemap_width),
            ("tilemap height", self.tilemap_height),
        ] {
            if value == 0 {
                return Err(Error::SchemaMismatch(format!("{} must be nonzero", name)));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    #[serde(skip_serializing, skip_deserializing)]
    pub modified: bool,
    pub project_path: Option<PathBuf>,
    pub defaults: ProjectConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectData {
    pub palettes: [Palette; PALETTE_COUNT],
    pub tileset: Tileset,
    pub chunkset: Chunkset,
    pub tilemap: Tilemap,
}

impl ProjectData {
    /// A blank project: black palettes, empty tiles, every chunk cell pointing
    /// at tile 0 and every map cell at chunk 0.
    pub fn new(config: &ProjectConfig) -> Result<Self> {
        config.validate()?;
        Ok(ProjectData {
            palettes: [Palette::default(); PALETTE_COUNT],
            tileset: Tileset::new(config.tileset_size),
            chunkset: Chunkset::new(config.chunkset_size, config.chunk_size),
            tilemap: Tilemap::new(config.tilemap_width, config.tilemap_height),
        })
    }

    /// Checks tile contents and that every cross-reference lands inside its sibling collection.
    pub fn validate(&self) -> Result<()> {
        for tile in &self.tileset.tiles {
            tile.validate()?;
        }
        self.chunkset.validate(self.tileset.size())?;
        self.tilemap.validate(self.chunkset.size())?;
        Ok(())
    }
}

/// Cached preview renders of the project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Views {
    pub tileset_sheet: PixelBuffer,
    pub chunkset_sheet: PixelBuffer,
    pub tilemap: PixelBuffer,
}

impl Views {
    pub fn render(project: &ProjectData, sheet_palette: PaletteIdx) -> Result<Self> {
        let palette = &project.palettes[check_index(
            "palette index",
            sheet_palette as usize,
            PALETTE_COUNT,
        )?];
        Ok(Views {
            tileset_sheet: render_tileset_sheet(&project.tileset, palette, TILESET_SHEET_COLUMNS)?,
            chunkset_sheet: render_chunkset_sheet(
                &project.chunkset,
                &project.tileset,
                &project.palettes,
                CHUNKSET_SHEET_COLUMNS,
            )?,
            tilemap: render_tilemap(
                &project.tilemap,
                &project.chunkset,
                &project.tileset,
                &project.palettes,
            )?,
        })
    }
}

pub struct EditorState {
    pub project: ProjectData,
    // Palette slot used to preview the tileset sheet.
    pub sheet_palette: PaletteIdx,
    pub views: Views,
    // Inverse messages, most recent last.
    pub undo_stack: Vec<Message>,
    pub redo_stack: Vec<Message>,
}

impl EditorState {
    pub fn new(project: ProjectData) -> Result<Self> {
        project.validate()?;
        let views = Views::render(&project, 0)?;
        Ok(EditorState {
            project,
            sheet_palette: 0,
            views,
            undo_stack: vec![],
            redo_stack: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ChunkTileRef, MapChunkRef};

    #[test]
    fn default_dimensions() {
        let project = ProjectData::new(&ProjectConfig::default()).unwrap();
        assert_eq!(project.tileset.size(), 1600);
        assert_eq!(project.chunkset.size(), 400);
        assert_eq!(project.chunkset.chunk_size, 4);
        assert_eq!(project.tilemap.width, 64);
        assert_eq!(project.tilemap.height, 32);
        assert_eq!(project.chunkset.chunks[399].cells[3][3], ChunkTileRef::default());
        project.validate().unwrap();
    }

    #[test]
    fn zero_dimensions_rejected() {
        let config = ProjectConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            ProjectData::new(&config),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn validate_catches_dangling_refs() {
        let mut project = ProjectData::new(&ProjectConfig {
            tileset_size: 2,
            chunkset_size: 1,
            chunk_size: 2,
            tilemap_width: 2,
            tilemap_height: 2,
        })
        .unwrap();
        project.tilemap.cells[0][1] = MapChunkRef::new(1);
        assert!(matches!(
            project.validate(),
            Err(Error::IndexOutOfRange { what: "chunk id", .. })
        ));
        project.tilemap.cells[0][1] = MapChunkRef::new(0);
        project.chunkset.chunks[0].cells[1][1] = ChunkTileRef::new(0, 2);
        assert!(matches!(
            project.validate(),
            Err(Error::IndexOutOfRange { what: "tile id", .. })
        ));
    }

    #[test]
    fn config_json_fills_missing_fields() {
        let config: GlobalConfig =
            serde_json::from_str(r#"{"defaults": {"chunkSize": 2}}"#).unwrap();
        assert_eq!(config.project_path, None);
        assert_eq!(config.defaults.chunk_size, 2);
        assert_eq!(config.defaults.tileset_size, 1600);
    }

    #[test]
    fn view_sizes() {
        let project = ProjectData::new(&ProjectConfig {
            tileset_size: 20,
            chunkset_size: 9,
            chunk_size: 2,
            tilemap_width: 3,
            tilemap_height: 2,
        })
        .unwrap();
        let state = EditorState::new(project).unwrap();
        assert_eq!(state.views.tileset_sheet.width, 128);
        assert_eq!(state.views.tileset_sheet.height, 16);
        assert_eq!(state.views.chunkset_sheet.width, 128);
        assert_eq!(state.views.chunkset_sheet.height, 32);
        assert_eq!(state.views.tilemap.width, 48);
        assert_eq!(state.views.tilemap.height, 32);
    }
}
