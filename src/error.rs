use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("Invalid SVG: {0}")]
    InvalidSvg(String),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Tile index {index} out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Document has no <metadata> element")]
    MissingMetadata,

    #[error("Document metadata has no cc:Work element")]
    MissingWorkContainer,
}
