use std::{collections::HashMap, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::application::DEFAULT_COLLECTION_MARKER;

/// Top-level object printed by `yt-dlp --dump-single-json`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaInfo {
    /// `"playlist"` for collections, absent or `"video"` for single items
    #[serde(rename = "_type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
    /// Unavailable playlist entries come back as `null`
    #[serde(default)]
    pub entries: Vec<Option<EntryInfo>>,
}

/// One downloadable format of a video
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatInfo {
    #[serde(default)]
    pub format_id: String,
    pub url: Option<String>,
    pub height: Option<u32>,
    #[serde(default)]
    pub ext: String,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub protocol: Option<String>,
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
}

impl FormatInfo {
    /// Plain HTTP(S) download carrying both audio and video
    pub fn is_progressive_http(&self) -> bool {
        let has_track = |codec: &Option<String>| codec.as_deref().is_some_and(|c| c != "none");
        let http = matches!(self.protocol.as_deref(), Some("http") | Some("https"));
        http && self.url.is_some() && has_track(&self.vcodec) && has_track(&self.acodec)
    }
}

/// Playlist entry as printed with `--flat-playlist`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntryInfo {
    #[serde(default)]
    pub id: String,
    pub url: Option<String>,
    pub title: Option<String>,
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub ytdlp_binary: PathBuf,
    pub collection_marker: String,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            ytdlp_binary: PathBuf::from("yt-dlp"),
            collection_marker: DEFAULT_COLLECTION_MARKER.to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                .to_string(),
        }
    }
}
