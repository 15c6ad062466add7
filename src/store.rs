//! The ordered collection of loaded tiles.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::Config;
use crate::error::TileError;

/// One loaded SVG file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub path: PathBuf,
    /// Raw document text as last read from or written to disk
    pub content: String,
}

impl Tile {
    /// Read a tile from disk.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, TileError> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Self { path, content }),
            Err(source) => Err(TileError::Read { path, source }),
        }
    }
}

/// Append-only list of tiles; insertion order is display order.
#[derive(Debug, Default)]
pub struct TileStore {
    tiles: Vec<Tile>,
}

impl TileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Read each path and append it. Unreadable files are logged and skipped.
    /// Returns how many tiles were added.
    pub fn load_from_paths<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let before = self.tiles.len();
        for path in paths {
            match Tile::load(path) {
                Ok(tile) => {
                    log::debug!("Loaded {}", tile.path.display());
                    self.tiles.push(tile);
                }
                Err(e) => log::warn!("Skipping tile: {}", e),
            }
        }
        self.tiles.len() - before
    }

    /// Recursively collect tile files under each directory and load them.
    /// Returns how many tiles were added.
    pub fn load_from_directories<I, P>(&mut self, dirs: I, config: &Config) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = dirs
            .into_iter()
            .flat_map(|dir| find_tiles(dir.as_ref(), config))
            .collect();
        self.load_from_paths(paths)
    }

    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Write `content` to the tile's file, then keep it in memory.
    ///
    /// If the write fails the in-memory tile is left untouched.
    pub fn replace_content(&mut self, index: usize, content: String) -> Result<(), TileError> {
        let len = self.tiles.len();
        let tile = self
            .tiles
            .get_mut(index)
            .ok_or(TileError::IndexOutOfRange { index, len })?;

        if let Err(source) = fs::write(&tile.path, &content) {
            log::error!("Failed to write {}: {}", tile.path.display(), source);
            return Err(TileError::Write {
                path: tile.path.clone(),
                source,
            });
        }

        log::info!("Saved {}", tile.path.display());
        tile.content = content;
        Ok(())
    }

    /// Drop every tile. Nothing on disk is touched.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

/// Every file below `dir` whose name ends in `.<extension>`, depth first in
/// directory-listing order.
pub fn find_tiles(dir: &Path, config: &Config) -> Vec<PathBuf> {
    let suffix = format!(".{}", config.extension);
    let mut paths = Vec::new();

    for entry in WalkDir::new(dir).follow_links(config.follow_links) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping directory entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_dir() && entry.file_name().to_string_lossy().ends_with(&suffix) {
            paths.push(entry.into_path());
        }
    }

    log::info!("Found {} tiles in {}", paths.len(), dir.display());
    paths
}
