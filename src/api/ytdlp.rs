use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

use super::{
    client::{ApiClient, ApiError, HttpSource, Result},
    models::{FormatInfo, MediaInfo},
};
use crate::{
    application::SourceResolver,
    domain::{AppError, Collection, ItemDescriptor, Resolution, StreamVariant},
};

pub struct YtDlpResolver {
    client: ApiClient,
    /// Metadata fetched by `resolve_single`, reused by the following `list_variants`.
    pending: Mutex<HashMap<String, MediaInfo>>,
}

impl YtDlpResolver {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            pending: Mutex::new(HashMap::new()),
        }
    }

    async fn dump_json(&self, url: &str, flat: bool) -> Result<MediaInfo> {
        Url::parse(url)?;

        let mut command = Command::new(&self.client.config().ytdlp_binary);
        command.arg("--dump-single-json").arg("--no-warnings");
        if flat {
            command.arg("--flat-playlist");
        }
        command.arg(url).kill_on_drop(true);

        debug!("Running {:?}", command);
        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::ApiError(stderr.trim().to_string()));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn remember(&self, url: &str, info: MediaInfo) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(url.to_string(), info);
        }
    }

    fn take_pending(&self, url: &str) -> Option<MediaInfo> {
        self.pending.lock().ok().and_then(|mut pending| pending.remove(url))
    }
}

fn is_playlist(info: &MediaInfo) -> bool {
    info.kind.as_deref() == Some("playlist")
}

pub(crate) fn collection_from_info(info: &MediaInfo) -> Collection {
    let items = info
        .entries
        .iter()
        .flatten()
        .filter_map(|entry| {
            let Some(url) = entry.url.clone() else {
                warn!("Skipping playlist entry {} without a URL", entry.id);
                return None;
            };
            let title = entry.title.clone().unwrap_or_else(|| entry.id.clone());
            Some((url, title))
        })
        .enumerate()
        .map(|(position, (source_url, title))| ItemDescriptor {
            source_url,
            title,
            collection_index: Some(position + 1),
        })
        .collect();

    Collection {
        title: info.title.clone(),
        items,
    }
}

/// One variant per supported height; later formats (better encodings) win.
pub(crate) fn variants_from_formats(
    client: &ApiClient,
    formats: &[FormatInfo],
) -> Vec<StreamVariant> {
    let mut by_resolution = BTreeMap::new();
    for format in formats.iter().filter(|f| f.is_progressive_http()) {
        let (Some(url), Some(resolution)) = (
            format.url.clone(),
            format.height.and_then(Resolution::from_height),
        ) else {
            continue;
        };

        let source = HttpSource::new(client.clone(), url, format.http_headers.clone());
        by_resolution.insert(
            resolution,
            StreamVariant {
                resolution,
                extension: format.ext.clone(),
                source: Arc::new(source),
            },
        );
    }
    by_resolution.into_values().collect()
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    fn collection_marker(&self) -> &str {
        &self.client.config().collection_marker
    }

    async fn resolve_single(&self, url: &str) -> std::result::Result<ItemDescriptor, AppError> {
        let info = self.dump_json(url, false).await?;
        if is_playlist(&info) {
            return Err(ApiError::UnexpectedKind { expected: "video" }.into());
        }

        let item = ItemDescriptor {
            source_url: url.to_string(),
            title: info.title.clone(),
            collection_index: None,
        };
        self.remember(url, info);
        Ok(item)
    }

    async fn resolve_collection(&self, url: &str) -> std::result::Result<Collection, AppError> {
        let info = self.dump_json(url, true).await?;
        if !is_playlist(&info) {
            return Err(ApiError::UnexpectedKind {
                expected: "playlist",
            }
            .into());
        }
        Ok(collection_from_info(&info))
    }

    async fn list_variants(
        &self,
        item: &ItemDescriptor,
    ) -> std::result::Result<Vec<StreamVariant>, AppError> {
        let info = match self.take_pending(&item.source_url) {
            Some(info) => info,
            None => self.dump_json(&item.source_url, false).await?,
        };
        Ok(variants_from_formats(&self.client, &info.formats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ApiConfig;

    const VIDEO_JSON: &str = r#"{
        "id": "abc123",
        "title": "Rust in 100 Seconds",
        "webpage_url": "https://www.youtube.com/watch?v=abc123",
        "formats": [
            {"format_id": "18", "url": "https://cdn.example/18", "height": 360, "ext": "mp4",
             "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "protocol": "https",
             "http_headers": {"User-Agent": "test"}},
            {"format_id": "137", "url": "https://cdn.example/137", "height": 1080, "ext": "mp4",
             "vcodec": "avc1.640028", "acodec": "none", "protocol": "https"},
            {"format_id": "22", "url": "https://cdn.example/22", "height": 720, "ext": "mp4",
             "vcodec": "avc1.64001F", "acodec": "mp4a.40.2", "protocol": "https"},
            {"format_id": "96", "url": "https://cdn.example/96.m3u8", "height": 1080, "ext": "mp4",
             "vcodec": "avc1.640028", "acodec": "mp4a.40.2", "protocol": "m3u8_native"},
            {"format_id": "43", "url": "https://cdn.example/43", "height": 360, "ext": "webm",
             "vcodec": "vp8", "acodec": "vorbis", "protocol": "https"},
            {"format_id": "sb0", "url": "https://cdn.example/sb", "height": 90, "ext": "mhtml",
             "vcodec": "none", "acodec": "none", "protocol": "mhtml"}
        ]
    }"#;

    const PLAYLIST_JSON: &str = r#"{
        "_type": "playlist",
        "id": "PL42",
        "title": "Systems: Programming / 2024",
        "entries": [
            {"id": "a", "url": "https://www.youtube.com/watch?v=a", "title": "One"},
            null,
            {"id": "b", "url": "https://www.youtube.com/watch?v=b"},
            {"id": "c", "title": "No URL"},
            {"id": "d", "url": "https://www.youtube.com/watch?v=d", "title": "Four"}
        ]
    }"#;

    #[test]
    fn test_variants_keep_progressive_http_formats() {
        let info: MediaInfo = serde_json::from_str(VIDEO_JSON).unwrap();
        let client = ApiClient::new(ApiConfig::default());

        let variants = variants_from_formats(&client, &info.formats);

        let summary: Vec<_> = variants
            .iter()
            .map(|v| (v.resolution, v.extension.as_str()))
            .collect();
        // the later webm 360p format replaces the earlier mp4 one
        assert_eq!(
            summary,
            vec![(Resolution::P360, "webm"), (Resolution::P720, "mp4")]
        );
    }

    #[test]
    fn test_collection_from_flat_playlist() {
        let info: MediaInfo = serde_json::from_str(PLAYLIST_JSON).unwrap();
        assert!(is_playlist(&info));

        let collection = collection_from_info(&info);

        assert_eq!(collection.title, "Systems: Programming / 2024");
        let items: Vec<_> = collection
            .items()
            .map(|i| (i.title.as_str(), i.collection_index))
            .collect();
        assert_eq!(items, vec![("One", Some(1)), ("b", Some(2)), ("Four", Some(3))]);
        assert_eq!(collection.items[2].source_url, "https://www.youtube.com/watch?v=d");
    }

    #[test]
    fn test_single_video_is_not_playlist() {
        let info: MediaInfo = serde_json::from_str(VIDEO_JSON).unwrap();
        assert!(!is_playlist(&info));
        assert!(info.entries.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_resolution_error() {
        let resolver = YtDlpResolver::new(ApiClient::new(ApiConfig::default()));

        let err = resolver.resolve_single("not a url").await.unwrap_err();

        assert_eq!(err.kind(), crate::domain::ErrorKind::Resolution);
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_resolution_error() {
        let config = ApiConfig {
            ytdlp_binary: "/nonexistent/yt-dlp".into(),
            ..ApiConfig::default()
        };
        let resolver = YtDlpResolver::new(ApiClient::new(config));

        let err = resolver
            .resolve_collection("https://www.youtube.com/playlist?list=PL42")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Resolution(_)));
    }

    #[test]
    fn test_marker_comes_from_config() {
        let config = ApiConfig {
            collection_marker: "list=".to_string(),
            ..ApiConfig::default()
        };
        let resolver = YtDlpResolver::new(ApiClient::new(config));

        assert_eq!(
            resolver.classify("https://www.youtube.com/watch?v=a&list=PL1"),
            crate::domain::SourceKind::Collection
        );
    }
}
