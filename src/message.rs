//! Messages exchanged between the viewer backend and its UI surface.
//!
//! Both directions are internally tagged JSON objects, e.g.
//! `{"type":"next-tile","index":"3"}`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TileError;
use crate::metadata::Metadata;

/// Status bar region a message is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusArea {
    Left,
    Middle,
    Right,
}

/// File-system timestamps as ISO-8601 UTC strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub atime: String,
    pub mtime: String,
    /// Creation time where the platform records it, else modification time
    pub ctime: String,
}

impl FileStats {
    pub fn read(path: &Path) -> Result<Self, TileError> {
        let meta = fs::metadata(path).map_err(|source| TileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mtime = meta.modified()?;

        Ok(Self {
            atime: iso_time(meta.accessed().unwrap_or(mtime)),
            mtime: iso_time(mtime),
            ctime: iso_time(meta.created().unwrap_or(mtime)),
        })
    }
}

fn iso_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `file://` URL for a tile path.
pub fn file_url(path: &Path) -> String {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|()| format!("file://{}", path.display()))
}

/// Everything the UI needs to display one tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TilePayload {
    pub index: usize,
    pub raw_content: String,
    pub file_url: String,
    pub file_stats: FileStats,
    #[serde(flatten)]
    pub metadata: Metadata,
    /// Set when the tile could not be parsed; metadata is then empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Backend → UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Outbound {
    ShowTile(TilePayload),
    ClearTile {
        #[serde(rename = "fileUrl")]
        file_url: String,
    },
    StatusMessage { text: String, area: StatusArea },
}

impl Outbound {
    pub fn status(text: impl Into<String>, area: StatusArea) -> Self {
        Outbound::StatusMessage {
            text: text.into(),
            area,
        }
    }
}

/// UI → backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Inbound {
    /// Result of the open-file dialog
    OpenFiles { paths: Vec<PathBuf> },
    /// Result of the open-folder dialog
    OpenFolders { paths: Vec<PathBuf> },
    CloseAll,
    UpdateTile { index: IndexArg, content: String },
    SaveKeywords { index: IndexArg, keywords: String },
    ResendTile { index: IndexArg },
    PreviousTile { index: IndexArg },
    NextTile { index: IndexArg },
}

/// A tile index as the UI sends it: a number or the text of a form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexArg {
    Number(i64),
    /// Fractional JSON number
    Float(f64),
    Text(String),
}

impl IndexArg {
    /// The index, if it is a non-negative integer. Fractions are truncated
    /// toward zero (`1.5` is 1, `-0.5` is 0). Text is read like an integer
    /// prefix: `" 3px"` is 3, `""` and `"x"` are invalid.
    pub fn resolve(&self) -> Option<usize> {
        match self {
            IndexArg::Number(n) => usize::try_from(*n).ok(),
            IndexArg::Float(f) => {
                let whole = f.trunc();
                (0.0..=u32::MAX as f64).contains(&whole).then(|| whole as usize)
            }
            IndexArg::Text(s) => {
                let s = s.trim_start();
                let (negative, digits) = match s.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, s.strip_prefix('+').unwrap_or(s)),
                };
                let end = digits
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(digits.len());
                let value: usize = digits[..end].parse().ok()?;
                (!negative || value == 0).then_some(value)
            }
        }
    }
}

/// Where the controller pushes outbound messages.
pub trait Surface {
    fn send(&mut self, message: Outbound);
}

impl Surface for Vec<Outbound> {
    fn send(&mut self, message: Outbound) {
        self.push(message);
    }
}

/// Writes each message as one line of JSON.
pub struct JsonLinesSurface<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSurface<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Surface for JsonLinesSurface<W> {
    fn send(&mut self, message: Outbound) {
        let result = serde_json::to_writer(&mut self.writer, &message)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush());
        if let Err(e) = result {
            log::error!("Failed to send message: {}", e);
        }
    }
}
