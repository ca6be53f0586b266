use std::{fmt, path::PathBuf, str::FromStr, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::AppError;

/// Resolutions a user can ask for, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resolution {
    P144,
    P240,
    P360,
    P480,
    P720,
    P1080,
}

impl Resolution {
    pub const ALL: [Resolution; 6] = [
        Self::P144,
        Self::P240,
        Self::P360,
        Self::P480,
        Self::P720,
        Self::P1080,
    ];

    pub fn height(self) -> u32 {
        match self {
            Self::P144 => 144,
            Self::P240 => 240,
            Self::P360 => 360,
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
        }
    }

    pub fn from_height(height: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.height() == height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

impl FromStr for Resolution {
    type Err = AppError;

    /// Accepts `"720"` as well as `"720p"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('p')
            .or_else(|| trimmed.strip_suffix('P'))
            .unwrap_or(trimmed);

        digits
            .parse::<u32>()
            .ok()
            .and_then(Self::from_height)
            .ok_or(AppError::InvalidResolution)
    }
}

/// A download submitted by the caller. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub resolution: Option<Resolution>,
    pub number_items: bool,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, resolution: Option<Resolution>, number_items: bool) -> Self {
        Self {
            url: url.into().trim().to_string(),
            resolution,
            number_items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Single,
    Collection,
}

/// One video, as produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    pub source_url: String,
    pub title: String,
    /// 1-based position inside a collection, `None` for single items.
    pub collection_index: Option<usize>,
}

/// A resolved playlist. `items()` can be iterated any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub title: String,
    pub items: Vec<ItemDescriptor>,
}

impl Collection {
    pub fn items(&self) -> impl Iterator<Item = &ItemDescriptor> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Chunked body of a variant: `(total size if known, chunks)`.
pub type ByteStream = (Option<u64>, BoxStream<'static, Result<Bytes, AppError>>);

/// Capability that produces the bytes of one variant.
#[async_trait]
pub trait ByteSource: Send + Sync {
    async fn open(&self) -> Result<ByteStream, AppError>;
}

/// A resolution-specific encoding of an item.
#[derive(Clone)]
pub struct StreamVariant {
    pub resolution: Resolution,
    /// File extension without the leading dot, e.g. `mp4`.
    pub extension: String,
    pub source: Arc<dyn ByteSource>,
}

impl fmt::Debug for StreamVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamVariant")
            .field("resolution", &self.resolution)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed(PathBuf),
    Failed(AppError),
    Aborted,
}

/// Orchestrator state. Pausing is a flag, not a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadPhase {
    #[default]
    Idle,
    Resolving,
    SingleTransfer,
    CollectionTransfer,
}

/// Aggregated per-item outcomes of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub completed: Vec<PathBuf>,
    /// 1-based indices of items that had no stream at all.
    pub skipped: Vec<usize>,
    pub failed: Vec<(usize, AppError)>,
    /// Set when the session ended before any item could be attempted.
    pub aborted: Option<AppError>,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        self.aborted.is_none()
            && self.skipped.is_empty()
            && self.failed.is_empty()
            && !self.completed.is_empty()
    }
}
