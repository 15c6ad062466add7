//! tile-viewer - browse SVG tiles and edit their keywords
//!
//! Tiles are SVG files carrying Dublin Core metadata. The crate loads them
//! into an ordered [`TileStore`], derives a flat [`Metadata`] record for
//! display, and rewrites the `dc:subject` keyword list in place while
//! leaving the rest of each file byte-for-byte intact.

use std::fs;
use std::path::Path;

mod ast;
mod config;
mod controller;
mod error;
mod message;
mod metadata;
mod parse;
mod serialize;
mod store;

pub use ast::*;
pub use config::*;
pub use controller::*;
pub use error::*;
pub use message::*;
pub use metadata::*;
pub use parse::*;
pub use serialize::*;
pub use store::*;

/// Read the metadata record of an SVG string.
pub fn read_metadata(svg: &str) -> Result<Metadata, TileError> {
    let doc = parse_svg(svg)?;
    Ok(extract_metadata(&doc))
}

/// Return `svg` with its keyword list replaced by the comma separated `keywords`.
pub fn set_keywords(svg: &str, keywords: &str) -> Result<String, TileError> {
    let mut doc = parse_svg(svg)?;
    apply_keywords(&mut doc, keywords)?;
    Ok(serialize(&doc))
}

/// Replace the keywords of the tile file at `path` in place.
pub fn tag_file(path: &Path, keywords: &str) -> Result<(), TileError> {
    let tile = Tile::load(path)?;
    let output = set_keywords(&tile.content, keywords)?;
    fs::write(path, output).map_err(|source| TileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Tagged {}", path.display());
    Ok(())
}

/// One JSON object describing a loaded tile: its path and either its
/// metadata or the parse error.
pub fn describe_tile(tile: &Tile) -> serde_json::Value {
    match read_metadata(&tile.content) {
        Ok(metadata) => serde_json::json!({ "path": tile.path, "metadata": metadata }),
        Err(e) => serde_json::json!({ "path": tile.path, "error": e.to_string() }),
    }
}
