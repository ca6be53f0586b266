use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{AppError, Resolution};

/// Everything the engine reports back to the presentation shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Human-readable line for a status label.
    StatusMessage(String),
    FallbackUsed {
        requested: Resolution,
        chosen: Resolution,
    },
    NoStreamsAvailable {
        title: String,
    },
    /// Bytes copied so far for the current item.
    Progress {
        downloaded: u64,
        total: Option<u64>,
    },
    DownloadComplete(PathBuf),
    DownloadError(AppError),
    ItemSkipped {
        index: usize,
        title: String,
    },
    ItemComplete {
        index: usize,
        title: String,
        path: PathBuf,
    },
    ItemError {
        index: usize,
        title: String,
        error: AppError,
    },
    PauseStateChanged(bool),
    /// `true` enables the pause control and disables start; `false` the reverse.
    ActiveStateChanged(bool),
}

/// Sending half handed to the worker. A dropped receiver is not an error.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<UnboundedSender<EngineEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<EngineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that discards everything.
    pub fn discard() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.emit(EngineEvent::StatusMessage(message.into()));
    }
}
