use std::path::PathBuf;

/// Viewer options.
#[derive(Debug, Clone)]
pub struct Config {
    /// Image shown when no tile is loaded
    pub placeholder: Option<PathBuf>,
    /// Follow symbolic links while scanning folders
    pub follow_links: bool,
    /// File-name suffix (without the dot) of tile files, matched case-sensitively
    pub extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholder: None,
            follow_links: true,
            extension: "svg".to_string(),
        }
    }
}
