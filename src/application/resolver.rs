use async_trait::async_trait;

use crate::domain::{AppError, Collection, ItemDescriptor, SourceKind, StreamVariant};

/// Token whose presence in a URL marks it as a playlist.
pub const DEFAULT_COLLECTION_MARKER: &str = "playlist";

/// Classify a URL by looking for `marker` anywhere in it.
pub fn classify(url: &str, marker: &str) -> SourceKind {
    if !marker.is_empty() && url.contains(marker) {
        SourceKind::Collection
    } else {
        SourceKind::Single
    }
}

#[async_trait]
pub trait SourceResolver: Send + Sync {
    fn collection_marker(&self) -> &str {
        DEFAULT_COLLECTION_MARKER
    }

    fn classify(&self, url: &str) -> SourceKind {
        classify(url, self.collection_marker())
    }

    /// Fails with [`AppError::Resolution`] if the URL cannot be reached or parsed.
    async fn resolve_single(&self, url: &str) -> Result<ItemDescriptor, AppError>;

    /// Playlist title plus its entries in source order, indexed from 1.
    async fn resolve_collection(&self, url: &str) -> Result<Collection, AppError>;

    /// May return an empty list.
    async fn list_variants(&self, item: &ItemDescriptor) -> Result<Vec<StreamVariant>, AppError>;
}
