use std::{fs::File, io::BufWriter, path::Path};

use turbulence::{
    codec::{
        asm::extract_bytes,
        binary::{decode_tileset, encode_tileset},
    },
    common::{ChunkTileRef, Color, MapChunkRef, Tileset},
    import::{import_file, load_image},
    persist::{
        export_all, export_asset, load_global_config, load_project, save_global_config, save_png,
        save_project, AssetKind,
    },
    state::{EditorState, GlobalConfig, ProjectConfig, ProjectData},
};

fn small_project() -> ProjectData {
    let mut project = ProjectData::new(&ProjectConfig {
        tileset_size: 4,
        chunkset_size: 2,
        chunk_size: 2,
        tilemap_width: 3,
        tilemap_height: 2,
    })
    .unwrap();
    project.palettes[0].colors[1] = Color::new(255, 0, 0);
    project.tileset.tiles[1].pixels[3][4] = 1;
    project.chunkset.chunks[1].cells[0][1] = ChunkTileRef {
        tile_id: 1,
        palette_index: 0,
        priority: true,
        h_flip: true,
        v_flip: false,
    };
    project.tilemap.cells[1][1] = MapChunkRef {
        chunk_id: 1,
        h_flip: false,
        v_flip: true,
    };
    project
}

fn write_png(
    path: &Path,
    width: u32,
    height: u32,
    color: png::ColorType,
    depth: png::BitDepth,
    palette: Option<Vec<u8>>,
    data: &[u8],
) {
    let file = File::create(path).unwrap();
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(color);
    encoder.set_depth(depth);
    if let Some(palette) = palette {
        encoder.set_palette(palette);
    }
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(data).unwrap();
    writer.finish().unwrap();
}

fn checkerboard() -> Vec<u8> {
    (0..64).map(|i| ((i % 8 + i / 8) % 2) as u8).collect()
}

#[test]
fn project_save_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("level.tge");
    let project = small_project();
    save_project(&path, &project).unwrap();
    assert_eq!(load_project(&path).unwrap(), project);
}

#[test]
fn corrupt_project_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.tge");
    std::fs::write(&path, br#"{"palettes": []}"#).unwrap();
    let err = load_project(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("schema mismatch"));
    assert!(load_project(&dir.path().join("missing.tge")).is_err());
}

#[test]
fn global_config_defaults_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg").join("config.json");
    let mut config = load_global_config(&path).unwrap();
    assert_eq!(config, GlobalConfig::default());

    // Unmodified configs aren't written.
    save_global_config(&path, &mut config).unwrap();
    assert!(!path.exists());

    config.project_path = Some(dir.path().join("level.tge"));
    config.defaults.chunk_size = 2;
    config.modified = true;
    save_global_config(&path, &mut config).unwrap();
    assert!(!config.modified);
    assert_eq!(load_global_config(&path).unwrap(), config);
}

#[test]
fn import_palette_from_asm() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pal.asm");
    std::fs::write(
        &path,
        "Pal: dc.w $0000,$0EEE ; black, white\n\tdc.w $000E,$00E0\n",
    )
    .unwrap();
    let mut state = EditorState::new(small_project()).unwrap();
    import_file(&mut state, AssetKind::Palette, &path, 3).unwrap();
    let pal = &state.project.palettes[3];
    assert_eq!(pal.colors[0], Color::new(0, 0, 0));
    assert_eq!(pal.colors[1], Color::new(255, 255, 255));
    assert_eq!(pal.colors[2], Color::new(255, 0, 0));
    assert_eq!(pal.colors[3], Color::new(0, 255, 0));
    assert_eq!(pal.colors[15], Color::default());
    // Slot 0 untouched.
    assert_eq!(state.project.palettes[0].colors[1], Color::new(255, 0, 0));
    assert_eq!(state.undo_stack.len(), 1);
}

#[test]
fn import_tileset_from_bin_keeps_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiles.bin");
    let mut tiles = Tileset::new(2);
    tiles.tiles[0].pixels[0] = [1, 2, 3, 4, 5, 6, 7, 8];
    tiles.tiles[1].pixels[7][7] = 15;
    std::fs::write(&path, encode_tileset(&tiles).unwrap()).unwrap();

    let mut state = EditorState::new(small_project()).unwrap();
    import_file(&mut state, AssetKind::Tileset, &path, 0).unwrap();
    assert_eq!(state.project.tileset.size(), 4);
    assert_eq!(state.project.tileset.tiles[..2], tiles.tiles[..]);
}

#[test]
fn import_rejects_misaligned_binary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiles.bin");
    std::fs::write(&path, [0u8; 33]).unwrap();
    let mut state = EditorState::new(small_project()).unwrap();
    let before = state.project.clone();
    assert!(import_file(&mut state, AssetKind::Tileset, &path, 0).is_err());
    assert_eq!(state.project, before);
}

#[test]
fn import_tilemap_needs_exact_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.bin");
    // 3x2 map: chunk 1 everywhere, hFlip on the first cell.
    let mut data = vec![];
    for i in 0..6 {
        let w: u16 = if i == 0 { 0x8001 } else { 0x0001 };
        data.extend(w.to_be_bytes());
    }
    std::fs::write(&path, &data).unwrap();
    let mut state = EditorState::new(small_project()).unwrap();
    import_file(&mut state, AssetKind::Tilemap, &path, 0).unwrap();
    assert_eq!(
        state.project.tilemap.cells[0][0],
        MapChunkRef {
            chunk_id: 1,
            h_flip: true,
            v_flip: false
        }
    );

    std::fs::write(&path, &data[..10]).unwrap();
    assert!(import_file(&mut state, AssetKind::Tilemap, &path, 0).is_err());
}

#[test]
fn indexed_png_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tile.png");
    let pixels = checkerboard();
    write_png(
        &path,
        8,
        8,
        png::ColorType::Indexed,
        png::BitDepth::Eight,
        Some(vec![0, 0, 0, 255, 255, 255]),
        &pixels,
    );

    let image = load_image(&path).unwrap();
    assert_eq!(image.indices, pixels);

    let mut state = EditorState::new(small_project()).unwrap();
    import_file(&mut state, AssetKind::Tileset, &path, 0).unwrap();
    let tile = &state.project.tileset.tiles[0];
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(tile.pixels[y][x], pixels[y * 8 + x]);
        }
    }
    import_file(&mut state, AssetKind::Palette, &path, 2).unwrap();
    assert_eq!(
        state.project.palettes[2].colors[1],
        Color::new(255, 255, 255)
    );
}

#[test]
fn packed_indexed_png_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packed.png");
    let pixels = checkerboard();
    let packed: Vec<u8> = pixels
        .chunks(2)
        .map(|p| (p[0] + 2) << 4 | (p[1] + 2))
        .collect();
    let palette: Vec<u8> = (0..4).flat_map(|i| [i * 60, 0, 0]).collect();
    write_png(
        &path,
        8,
        8,
        png::ColorType::Indexed,
        png::BitDepth::Four,
        Some(palette),
        &packed,
    );
    let image = load_image(&path).unwrap();
    let expected: Vec<u8> = pixels.iter().map(|p| p + 2).collect();
    assert_eq!(image.indices, expected);
    assert_eq!(image.color_table[3], Color::new(180, 0, 0));
}

#[test]
fn rgba_png_indexed_by_appearance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rgba.png");
    let rgba: Vec<u8> = checkerboard()
        .iter()
        .flat_map(|&p| if p == 0 { [0, 0, 0, 0] } else { [9, 8, 7, 255] })
        .collect();
    write_png(
        &path,
        8,
        8,
        png::ColorType::Rgba,
        png::BitDepth::Eight,
        None,
        &rgba,
    );
    let image = load_image(&path).unwrap();
    assert_eq!(image.indices, checkerboard());
    assert_eq!(image.color_table, vec![Color::default(), Color::new(9, 8, 7)]);
}

#[test]
fn export_asm_reimports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiles.s");
    let project = small_project();
    export_asset(&path, &project, AssetKind::Tileset).unwrap();
    let source = std::fs::read_to_string(&path).unwrap();
    assert!(source.starts_with("Tileset:\n\tdc.w "));
    let tileset = decode_tileset(&extract_bytes(&source).unwrap()).unwrap();
    assert_eq!(tileset, project.tileset);

    let mut state = EditorState::new(ProjectData::new(&ProjectConfig {
        tileset_size: 4,
        chunkset_size: 2,
        chunk_size: 2,
        tilemap_width: 3,
        tilemap_height: 2,
    })
    .unwrap())
    .unwrap();
    for kind in [AssetKind::Tileset, AssetKind::Palette] {
        let path = dir.path().join(format!("{}.asm", kind.name()));
        export_asset(&path, &project, kind).unwrap();
        import_file(&mut state, kind, &path, 0).unwrap();
    }
    let path = dir.path().join("chunks.bin");
    export_asset(&path, &project, AssetKind::Chunkset).unwrap();
    import_file(&mut state, AssetKind::Chunkset, &path, 0).unwrap();
    let path = dir.path().join("map.bin");
    export_asset(&path, &project, AssetKind::Tilemap).unwrap();
    import_file(&mut state, AssetKind::Tilemap, &path, 0).unwrap();
    assert_eq!(state.project, project);
}

#[test]
fn export_all_writes_each_kind() {
    let dir = tempfile::tempdir().unwrap();
    let paths = export_all(&dir.path().join("level.bin"), &small_project()).unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "level_palette.bin",
            "level_tileset.bin",
            "level_chunkset.bin",
            "level_tilemap.bin"
        ]
    );
    assert_eq!(std::fs::read(&paths[0]).unwrap().len(), 4 * 16 * 2);
    assert_eq!(std::fs::read(&paths[1]).unwrap().len(), 4 * 32);
    assert_eq!(std::fs::read(&paths[2]).unwrap().len(), 2 * 4 * 2);
    assert_eq!(std::fs::read(&paths[3]).unwrap().len(), 3 * 2 * 2);
}

#[test]
fn render_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.png");
    let state = EditorState::new(small_project()).unwrap();
    save_png(&path, &state.views.tilemap).unwrap();

    let decoder = png::Decoder::new(File::open(&path).unwrap());
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();
    assert_eq!((info.width, info.height), (48, 32));
    assert_eq!(buf[..info.buffer_size()], state.views.tilemap.to_rgba8()[..]);
}
