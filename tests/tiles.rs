//! End-to-end tests: tiles on disk, a controller, and the messages it sends.

use std::fs;
use std::path::{Path, PathBuf};

use tile_viewer::*;

const TILE: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<svg
   xmlns:dc="http://purl.org/dc/elements/1.1/"
   xmlns:cc="http://creativecommons.org/ns#"
   xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
   xmlns="http://www.w3.org/2000/svg"
   width="32" height="32" viewBox="0 0 32 32">
  <title>Grass</title>
  <metadata
     id="metadata7">
    <rdf:RDF>
      <cc:Work
         rdf:about="">
        <dc:format>image/svg+xml</dc:format>
        <dc:type
           rdf:resource="http://purl.org/dc/dcmitype/StillImage" />
        <dc:creator>
          <cc:Agent>
            <dc:title>Jane</dc:title>
          </cc:Agent>
        </dc:creator>
        <dc:subject>
          <rdf:Bag>
            <rdf:li>grass</rdf:li>
          </rdf:Bag>
        </dc:subject>
      </cc:Work>
    </rdf:RDF>
  </metadata>
  <rect width="32" height="32" fill="#3a3"/>
</svg>
"##;

fn write_tile(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn payloads(messages: &[Outbound]) -> Vec<&TilePayload> {
    messages
        .iter()
        .filter_map(|m| match m {
            Outbound::ShowTile(p) => Some(p),
            _ => None,
        })
        .collect()
}

#[test]
fn test_save_keywords_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tile(dir.path(), "grass.svg", TILE);

    let mut controller = Controller::new(Vec::new(), Config::default());
    controller.handle(Inbound::OpenFiles { paths: vec![path.clone()] });
    assert_eq!(payloads(controller.surface())[0].metadata.keywords, "grass");

    controller.surface_mut().clear();
    controller.handle(Inbound::SaveKeywords {
        index: IndexArg::Text("0".into()),
        keywords: "a, b ,c".into(),
    });

    // Redisplayed with the normalised list
    let shown = payloads(controller.surface());
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].metadata.keywords, "a, b, c");
    assert_eq!(shown[0].metadata.creator, "Jane");

    // Persisted, and the store matches the file
    let on_disk = fs::read_to_string(&path).unwrap();
    assert_eq!(controller.store().get(0).unwrap().content, on_disk);
    assert_eq!(read_metadata(&on_disk).unwrap().keywords, "a, b, c");

    // Everything outside the keyword subtree is untouched
    let subject = TILE.find("<dc:subject>").unwrap();
    assert!(on_disk.starts_with(&TILE[..subject]));
    let work_end = TILE.find("\n      </cc:Work>").unwrap();
    assert!(on_disk.ends_with(&TILE[work_end..]));
}

#[test]
fn test_saving_twice_does_not_accumulate() {
    let once = set_keywords(TILE, "x, y").unwrap();
    let twice = set_keywords(&once, "x, y").unwrap();
    assert_eq!(once, twice);
    assert_eq!(twice.matches("<dc:subject>").count(), 1);
}

#[test]
fn test_folder_scan_and_navigation() {
    let dir = tempfile::tempdir().unwrap();
    write_tile(dir.path(), "a.svg", TILE);
    write_tile(dir.path(), "set/b.svg", TILE);
    write_tile(dir.path(), "set/deep/c.svg", TILE);
    write_tile(dir.path(), "set/readme.md", "# tiles");

    let mut controller = Controller::new(Vec::new(), Config::default());
    assert_eq!(controller.open_folders([dir.path()]), 3);
    assert_eq!(payloads(controller.surface()).len(), 1);
    assert_eq!(payloads(controller.surface())[0].index, 0);

    controller.surface_mut().clear();
    controller.handle(Inbound::NextTile { index: IndexArg::Text("0".into()) });
    controller.handle(Inbound::NextTile { index: IndexArg::Text("1".into()) });
    controller.handle(Inbound::NextTile { index: IndexArg::Text("2".into()) });
    controller.handle(Inbound::PreviousTile { index: IndexArg::Number(0) });

    let indices: Vec<_> = payloads(controller.surface()).iter().map(|p| p.index).collect();
    assert_eq!(indices, [1, 2]);
    assert!(controller
        .surface()
        .contains(&Outbound::status("Showing 3 of 3", StatusArea::Middle)));
}

#[test]
fn test_load_counts_only_readable_files() {
    let dir = tempfile::tempdir().unwrap();
    let good: Vec<_> = (0..3)
        .map(|i| write_tile(dir.path(), &format!("{}.svg", i), TILE))
        .collect();

    let mut store = TileStore::new();
    store.load_from_paths(&good[..1]);

    let mut batch = good[1..].to_vec();
    batch.push(dir.path().join("gone.svg"));
    batch.push(dir.path().to_path_buf()); // a directory cannot be read as text
    let added = store.load_from_paths(batch);

    assert_eq!(added, 2);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_failed_write_keeps_memory_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tile(dir.path(), "sub/grass.svg", TILE);

    let mut controller = Controller::new(Vec::new(), Config::default());
    controller.open_files([&path]);
    fs::remove_dir_all(dir.path().join("sub")).unwrap();
    controller.surface_mut().clear();

    controller.handle(Inbound::UpdateTile {
        index: IndexArg::Number(0),
        content: "<svg/>".into(),
    });

    assert_eq!(controller.store().get(0).unwrap().content, TILE);
    assert!(payloads(controller.surface()).is_empty());
    assert!(matches!(
        controller.surface().as_slice(),
        [Outbound::StatusMessage { area: StatusArea::Left, .. }]
    ));
}

#[test]
fn test_close_all_then_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tile(dir.path(), "grass.svg", TILE);
    let placeholder = write_tile(dir.path(), "assets/no-tile-loaded.svg", "<svg/>");

    let config = Config {
        placeholder: Some(placeholder),
        ..Config::default()
    };
    let mut controller = Controller::new(Vec::new(), config);
    controller.open_files([&path, &path]);
    assert_eq!(controller.store().len(), 2);

    controller.surface_mut().clear();
    controller.handle(Inbound::CloseAll);
    assert!(controller.store().is_empty());
    assert!(matches!(
        &controller.surface()[0],
        Outbound::ClearTile { file_url } if file_url.ends_with("assets/no-tile-loaded.svg")
    ));

    controller.handle(Inbound::NextTile { index: IndexArg::Number(0) });
    controller.open_files([&path]);
    assert_eq!(payloads(controller.surface())[0].index, 0);
}

#[test]
fn test_json_lines_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tile(dir.path(), "grass.svg", TILE);

    let mut controller = Controller::new(JsonLinesSurface::new(Vec::new()), Config::default());
    let open = serde_json::json!({ "type": "open-files", "paths": [path] }).to_string();
    for line in [open.as_str(), r#"{"type":"resend-tile","index":"0"}"#, r#"{"type":"next-tile","index":"0"}"#] {
        controller.handle(serde_json::from_str(line).unwrap());
    }

    let out = String::from_utf8(controller.into_surface().into_inner()).unwrap();
    let messages: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let types: Vec<_> = messages.iter().map(|m| m["type"].as_str().unwrap()).collect();
    assert_eq!(
        types,
        ["status-message", "status-message", "show-tile", "status-message", "show-tile", "status-message"]
    );
    assert_eq!(messages[2]["title"], "Grass");
    assert_eq!(messages[2]["keywords"], "grass");
    assert_eq!(messages[2]["index"], 0);
    assert_eq!(messages[5]["text"], "Showing 1 of 1");
}

#[test]
fn test_tag_file_rewrites_keywords_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tile(dir.path(), "grass.svg", TILE);

    tag_file(&path, "meadow, green").unwrap();
    let on_disk = fs::read_to_string(&path).unwrap();
    assert_eq!(read_metadata(&on_disk).unwrap().keywords, "meadow, green");
    assert_eq!(on_disk, set_keywords(TILE, "meadow, green").unwrap());

    let bare = write_tile(dir.path(), "bare.svg", "<svg/>");
    assert!(matches!(tag_file(&bare, "x"), Err(TileError::MissingMetadata)));
    assert_eq!(fs::read_to_string(&bare).unwrap(), "<svg/>");

    assert!(matches!(
        tag_file(&dir.path().join("gone.svg"), "x"),
        Err(TileError::Read { .. })
    ));
}

#[test]
fn test_describe_tile() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_tile(dir.path(), "grass.svg", TILE);
    let bad = write_tile(dir.path(), "bad.svg", "<svg><g></svg>");

    let mut store = TileStore::new();
    store.load_from_paths([&good, &bad]);

    let good = describe_tile(store.get(0).unwrap());
    assert_eq!(good["metadata"]["title"], "Grass");
    assert_eq!(good["metadata"]["keywords"], "grass");
    assert!(good.get("error").is_none());

    let bad = describe_tile(store.get(1).unwrap());
    assert!(bad["path"].as_str().unwrap().ends_with("bad.svg"));
    assert!(bad["error"].is_string());
    assert!(bad.get("metadata").is_none());
}
