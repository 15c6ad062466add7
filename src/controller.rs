//! Drives what the UI shows: loading, navigation, saving and clearing.

use std::path::{Path, PathBuf};

use crate::error::TileError;
use crate::message::*;
use crate::metadata::{Metadata, apply_keywords, extract_metadata};
use crate::parse::parse_svg;
use crate::serialize::serialize;
use crate::store::TileStore;
use crate::Config;

/// Owns the tile store and pushes display updates into a [`Surface`].
pub struct Controller<S: Surface> {
    store: TileStore,
    surface: S,
    config: Config,
}

impl<S: Surface> Controller<S> {
    pub fn new(surface: S, config: Config) -> Self {
        Self {
            store: TileStore::new(),
            surface,
            config,
        }
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Load files and show the first one added. Returns how many were added.
    pub fn open_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let first_new = self.store.len();
        let added = self.store.load_from_paths(paths);
        self.loaded(first_new, added);
        added
    }

    /// Load every tile below the given folders and show the first one added.
    pub fn open_folders<I, P>(&mut self, dirs: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let first_new = self.store.len();
        let added = self.store.load_from_directories(dirs, &self.config);
        self.loaded(first_new, added);
        added
    }

    fn loaded(&mut self, first_new: usize, added: usize) {
        if added == 0 {
            log::info!("No tiles were added");
            return;
        }
        self.status(format!("Added: {}", added), StatusArea::Left);
        self.status(format!("Tiles: {}", self.store.len()), StatusArea::Right);
        self.show_tile(first_new);
    }

    /// Send the display payload for `index`. Out-of-range indices are
    /// ignored; returns whether anything was sent.
    pub fn show_tile(&mut self, index: usize) -> bool {
        let Some(tile) = self.store.get(index) else {
            return false;
        };

        let file_stats = FileStats::read(&tile.path).unwrap_or_else(|e| {
            log::warn!("No file stats: {}", e);
            FileStats::default()
        });
        let (metadata, error) = match parse_svg(&tile.content) {
            Ok(doc) => (extract_metadata(&doc), None),
            Err(e) => {
                log::warn!("Cannot parse {}: {}", tile.path.display(), e);
                (Metadata::default(), Some(e.to_string()))
            }
        };

        let payload = TilePayload {
            index,
            raw_content: tile.content.clone(),
            file_url: file_url(&tile.path),
            file_stats,
            metadata,
            error: error.clone(),
        };
        let name = tile.path.display().to_string();
        let total = self.store.len();

        self.surface.send(Outbound::ShowTile(payload));
        if let Some(error) = error {
            self.status(format!("Unreadable tile {}: {}", name, error), StatusArea::Left);
        }
        self.status(format!("Showing {} of {}", index + 1, total), StatusArea::Middle);
        true
    }

    pub fn previous(&mut self, index: usize) -> bool {
        match index.checked_sub(1) {
            Some(prev) => self.show_tile(prev),
            None => false,
        }
    }

    pub fn next(&mut self, index: usize) -> bool {
        match index.checked_add(1) {
            Some(next) if next < self.store.len() => self.show_tile(next),
            _ => false,
        }
    }

    /// Rewrite the tile's keywords and save it. Out-of-range indices are
    /// ignored.
    pub fn save_keywords(&mut self, index: usize, keywords: &str) -> Result<(), TileError> {
        let Some(tile) = self.store.get(index) else {
            return Ok(());
        };

        let mut doc = parse_svg(&tile.content)?;
        apply_keywords(&mut doc, keywords)?;
        self.update_tile(index, serialize(&doc))
    }

    /// Save raw document text for a tile and redisplay it. Out-of-range
    /// indices are ignored.
    pub fn update_tile(&mut self, index: usize, content: String) -> Result<(), TileError> {
        if index >= self.store.len() {
            return Ok(());
        }

        self.store.replace_content(index, content)?;
        self.show_tile(index);
        Ok(())
    }

    /// Forget every tile and reset the display.
    pub fn clear_all(&mut self) {
        self.store.clear();

        let file_url = self
            .config
            .placeholder
            .as_deref()
            .map(file_url)
            .unwrap_or_default();
        self.surface.send(Outbound::ClearTile { file_url });
        self.status("Added: 0", StatusArea::Left);
        self.status("0 of 0", StatusArea::Middle);
        self.status("Tiles: 0", StatusArea::Right);
    }

    /// Act on one message from the UI. Failures are logged and reported
    /// in the status bar.
    pub fn handle(&mut self, message: Inbound) {
        let result = match message {
            Inbound::OpenFiles { paths } => {
                self.open_files(paths);
                Ok(())
            }
            Inbound::OpenFolders { paths } => {
                self.open_folders(paths);
                Ok(())
            }
            Inbound::CloseAll => {
                self.clear_all();
                Ok(())
            }
            Inbound::UpdateTile { index, content } => match index.resolve() {
                Some(index) => self.update_tile(index, content),
                None => Ok(()),
            },
            Inbound::SaveKeywords { index, keywords } => match index.resolve() {
                Some(index) => self.save_keywords(index, &keywords),
                None => Ok(()),
            },
            Inbound::ResendTile { index } => {
                if let Some(index) = index.resolve() {
                    self.show_tile(index);
                }
                Ok(())
            }
            Inbound::PreviousTile { index } => {
                if let Some(index) = index.resolve() {
                    self.previous(index);
                }
                Ok(())
            }
            Inbound::NextTile { index } => {
                if let Some(index) = index.resolve() {
                    self.next(index);
                }
                Ok(())
            }
        };

        if let Err(e) = result {
            log::error!("{}", e);
            self.status(format!("Save failed: {}", e), StatusArea::Left);
        }
    }

    fn status(&mut self, text: impl Into<String>, area: StatusArea) {
        self.surface.send(Outbound::status(text, area));
    }
}
