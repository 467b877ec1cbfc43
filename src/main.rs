use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hashbrown::HashSet;
use log::{error, info};
use turbulence::{
    common::PaletteIdx,
    import::import_file,
    message::Message,
    persist::{
        export_all, export_asset, get_global_config_path, load_global_config, load_project,
        save_global_config, save_png, save_project, AssetKind,
    },
    state::{EditorState, GlobalConfig, ProjectData},
    update::update,
};

#[derive(Parser, Debug)]
#[command(version, about = "Palette, tile, chunk and tilemap editor for 16-bit console graphics")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ExportTarget {
    Palette,
    Tileset,
    Chunkset,
    Tilemap,
    All,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum View {
    Tileset,
    Chunkset,
    Tilemap,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a blank project; sizes default to the global config.
    New {
        path: PathBuf,
        #[arg(long)]
        tiles: Option<usize>,
        #[arg(long)]
        chunks: Option<usize>,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        width: Option<usize>,
        #[arg(long)]
        height: Option<usize>,
    },
    /// Summarize a project.
    Info { project: Option<PathBuf> },
    /// Import a palette, tileset, chunkset or tilemap from .bin, .asm/.s or an image.
    Import {
        #[arg(long)]
        project: Option<PathBuf>,
        kind: AssetKind,
        file: PathBuf,
        /// First palette slot to fill.
        #[arg(long, default_value_t = 0)]
        slot: PaletteIdx,
    },
    /// Export as raw binary, or as assembly source for .asm/.s paths.
    Export {
        #[arg(long)]
        project: Option<PathBuf>,
        target: ExportTarget,
        out: PathBuf,
    },
    /// Render a preview to PNG.
    Render {
        #[arg(long)]
        project: Option<PathBuf>,
        view: View,
        out: PathBuf,
        /// Palette slot for the tileset sheet.
        #[arg(long, default_value_t = 0)]
        palette: PaletteIdx,
    },
}

struct Cli {
    config_path: PathBuf,
    config: GlobalConfig,
}

impl Cli {
    fn new() -> Result<Self> {
        let config_path = get_global_config_path()?;
        let config = load_global_config(&config_path)?;
        Ok(Cli {
            config_path,
            config,
        })
    }

    fn project_path(&self, arg: Option<PathBuf>) -> Result<PathBuf> {
        arg.or_else(|| self.config.project_path.clone())
            .context("No project given and no previous project recorded.")
    }

    fn remember(&mut self, path: &Path) -> Result<()> {
        if self.config.project_path.as_deref() != Some(path) {
            self.config.project_path = Some(path.to_owned());
            self.config.modified = true;
        }
        save_global_config(&self.config_path, &mut self.config)
    }

    fn open(&mut self, arg: Option<PathBuf>) -> Result<(PathBuf, ProjectData)> {
        let path = self.project_path(arg)?;
        let project = load_project(&path)?;
        self.remember(&path)?;
        Ok((path, project))
    }

    fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::New {
                path,
                tiles,
                chunks,
                chunk_size,
                width,
                height,
            } => {
                let mut config = self.config.defaults;
                config.tileset_size = tiles.unwrap_or(config.tileset_size);
                config.chunkset_size = chunks.unwrap_or(config.chunkset_size);
                config.chunk_size = chunk_size.unwrap_or(config.chunk_size);
                config.tilemap_width = width.unwrap_or(config.tilemap_width);
                config.tilemap_height = height.unwrap_or(config.tilemap_height);
                let project = ProjectData::new(&config).context("Invalid project dimensions")?;
                save_project(&path, &project)?;
                self.remember(&path)?;
            }
            Command::Info { project } => {
                let (path, project) = self.open(project)?;
                print_info(&path, &project);
            }
            Command::Import {
                project,
                kind,
                file,
                slot,
            } => {
                let (path, project) = self.open(project)?;
                let mut state = EditorState::new(project)?;
                import_file(&mut state, kind, &file, slot)?;
                save_project(&path, &state.project)?;
            }
            Command::Export {
                project,
                target,
                out,
            } => {
                let (_, project) = self.open(project)?;
                let kind = match target {
                    ExportTarget::Palette => AssetKind::Palette,
                    ExportTarget::Tileset => AssetKind::Tileset,
                    ExportTarget::Chunkset => AssetKind::Chunkset,
                    ExportTarget::Tilemap => AssetKind::Tilemap,
                    ExportTarget::All => {
                        let paths = export_all(&out, &project)?;
                        info!("Wrote {} files", paths.len());
                        return Ok(());
                    }
                };
                export_asset(&out, &project, kind)?;
            }
            Command::Render {
                project,
                view,
                out,
                palette,
            } => {
                let (_, project) = self.open(project)?;
                let mut state = EditorState::new(project)?;
                update(&mut state, Message::SelectSheetPalette(palette))?;
                let buf = match view {
                    View::Tileset => &state.views.tileset_sheet,
                    View::Chunkset => &state.views.chunkset_sheet,
                    View::Tilemap => &state.views.tilemap,
                };
                save_png(&out, buf)?;
            }
        }
        Ok(())
    }
}

fn print_info(path: &Path, project: &ProjectData) {
    let used_chunks: HashSet<_> = project
        .tilemap
        .cells
        .iter()
        .flatten()
        .map(|c| c.chunk_id)
        .collect();
    let used_tiles: HashSet<_> = project
        .chunkset
        .chunks
        .iter()
        .flat_map(|c| c.cells.iter().flatten())
        .map(|c| c.tile_id)
        .collect();
    println!("{}", path.display());
    println!("  palettes: {}", project.palettes.len());
    println!(
        "  tileset:  {} tiles ({} referenced by chunks)",
        project.tileset.size(),
        used_tiles.len()
    );
    println!(
        "  chunkset: {} chunks of {}x{} ({} placed on the map)",
        project.chunkset.size(),
        project.chunkset.chunk_size,
        project.chunkset.chunk_size,
        used_chunks.len()
    );
    println!(
        "  tilemap:  {}x{}",
        project.tilemap.width, project.tilemap.height
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let result = Cli::new().and_then(|mut cli| cli.run(args.command));
    if let Err(e) = result {
        error!("{:?}", e);
        std::process::exit(1);
    }
}
