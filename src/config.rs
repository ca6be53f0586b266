use std::path::PathBuf;

/// Folder downloads land in when nothing else is configured.
pub const DEFAULT_DOWNLOAD_ROOT: &str = "Flash Youtube Downloads";

/// Configuration for the download engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Single items are written here; collections get a sub-folder.
    pub download_root: PathBuf,
}

impl EngineConfig {
    pub fn with_download_root(download_root: impl Into<PathBuf>) -> Self {
        Self {
            download_root: download_root.into(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_download_root(DEFAULT_DOWNLOAD_ROOT)
    }
}
