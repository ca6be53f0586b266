use std::{path::Path, sync::Arc};

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    config::EngineConfig,
    domain::{
        AppError, DownloadPhase, DownloadRequest, ItemDescriptor, Resolution, SessionReport,
        SourceKind, StreamVariant, TransferOutcome,
    },
    utils::{numbered_title, sanitize_collection_title},
};

use super::{
    events::{EngineEvent, EventSink},
    resolver::SourceResolver,
    selector::{self, Selection},
    session::SessionControl,
    transfer::TransferController,
};

#[derive(Clone)]
pub struct DownloadOrchestrator {
    resolver: Arc<dyn SourceResolver>,
    config: EngineConfig,
    control: SessionControl,
    events: EventSink,
    transfer: TransferController,
}

/// Tears the session down when the worker finishes, however it finishes.
struct SessionGuard {
    control: SessionControl,
    events: EventSink,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.control.deactivate();
        self.events.emit(EngineEvent::ActiveStateChanged(false));
    }
}

impl DownloadOrchestrator {
    pub fn new(resolver: Arc<dyn SourceResolver>, config: EngineConfig, events: EventSink) -> Self {
        let control = SessionControl::new();
        let transfer = TransferController::new(control.clone(), events.clone());
        Self {
            resolver,
            config,
            control,
            events,
            transfer,
        }
    }

    pub fn is_active(&self) -> bool {
        self.control.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    pub fn phase(&self) -> DownloadPhase {
        self.control.state().phase
    }

    /// Starts a session on a background task and returns immediately.
    ///
    /// Fails with [`AppError::InvalidResolution`] when no resolution was
    /// chosen and with [`AppError::SessionBusy`] while another session runs.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, request: DownloadRequest) -> Result<JoinHandle<SessionReport>, AppError> {
        let (resolution, guard) = self.begin(&request)?;
        let this = self.clone();
        Ok(tokio::spawn(async move {
            this.run_session(&request, resolution, guard).await
        }))
    }

    /// Same as [`start`](Self::start) but runs the session on the current task.
    pub async fn run(&self, request: DownloadRequest) -> Result<SessionReport, AppError> {
        let (resolution, guard) = self.begin(&request)?;
        Ok(self.run_session(&request, resolution, guard).await)
    }

    /// Flips pause for the active session and returns the new state.
    /// Without an active session this does nothing and returns `None`.
    pub fn toggle_pause(&self) -> Option<bool> {
        let paused = self.control.toggle_pause()?;
        if paused {
            info!("Pausing download...");
            self.events.status("Pausing download...");
        } else {
            info!("Resuming download...");
            self.events.status("Resuming download...");
        }
        self.events.emit(EngineEvent::PauseStateChanged(paused));
        Some(paused)
    }

    fn begin(&self, request: &DownloadRequest) -> Result<(Resolution, SessionGuard), AppError> {
        let Some(resolution) = request.resolution else {
            warn!("Download attempted without selecting a valid resolution.");
            self.events.status(AppError::InvalidResolution.to_string());
            return Err(AppError::InvalidResolution);
        };

        if !self.control.try_activate() {
            warn!("Rejected download of {}: session busy", request.url);
            return Err(AppError::SessionBusy);
        }

        let guard = SessionGuard {
            control: self.control.clone(),
            events: self.events.clone(),
        };
        self.events.emit(EngineEvent::ActiveStateChanged(true));
        self.events.status("Starting download...");
        info!("Starting download: {} at resolution {resolution}", request.url);

        Ok((resolution, guard))
    }

    async fn run_session(
        &self,
        request: &DownloadRequest,
        resolution: Resolution,
        _guard: SessionGuard,
    ) -> SessionReport {
        self.control.set_phase(DownloadPhase::Resolving);

        let root = &self.config.download_root;
        if let Err(e) = tokio::fs::create_dir_all(root).await {
            let err = AppError::Io(format!("Failed to create {}: {e}", root.display()));
            error!("{err}");
            self.events.status(err.to_string());
            self.events.emit(EngineEvent::DownloadError(err.clone()));
            return SessionReport {
                aborted: Some(err),
                ..Default::default()
            };
        }

        match self.resolver.classify(&request.url) {
            SourceKind::Single => {
                info!("Downloading video: {}", request.url);
                self.download_single(&request.url, resolution).await
            }
            SourceKind::Collection => {
                info!("Downloading playlist: {}", request.url);
                self.download_collection(request, resolution).await
            }
        }
    }

    async fn download_single(&self, url: &str, resolution: Resolution) -> SessionReport {
        let mut report = SessionReport::default();

        let item = match self.resolver.resolve_single(url).await {
            Ok(item) => item,
            Err(e) => {
                error!("Error initializing download for video {url}: {e}");
                self.events.status(format!("Error initializing download: {e}"));
                self.events.emit(EngineEvent::DownloadError(e.clone()));
                report.aborted = Some(e);
                return report;
            }
        };
        self.events.status(format!("Video title: {}", item.title));

        let variants = match self.resolver.list_variants(&item).await {
            Ok(variants) => variants,
            Err(e) => {
                error!("Error listing streams for {}: {e}", item.title);
                self.events.status(format!("Error initializing download: {e}"));
                self.events.emit(EngineEvent::DownloadError(e.clone()));
                report.aborted = Some(e);
                return report;
            }
        };

        let Ok(selection) = self.pick(&variants, resolution, &item) else {
            error!("No available streams found.");
            self.events.status("No available streams for this video.");
            self.events.emit(EngineEvent::NoStreamsAvailable {
                title: item.title.clone(),
            });
            report.skipped.push(1);
            return report;
        };

        self.control.set_phase(DownloadPhase::SingleTransfer);
        info!("Starting download for video: {}", item.title);
        let outcome = self
            .transfer
            .execute(&selection.variant, &self.config.download_root, &item.title)
            .await;

        match into_result(outcome) {
            Ok(path) => {
                self.events.emit(EngineEvent::DownloadComplete(path.clone()));
                report.completed.push(path);
            }
            Err(e) => {
                self.events.emit(EngineEvent::DownloadError(e.clone()));
                report.failed.push((1, e));
            }
        }
        report
    }

    async fn download_collection(
        &self,
        request: &DownloadRequest,
        resolution: Resolution,
    ) -> SessionReport {
        let mut report = SessionReport::default();

        let collection = match self.resolver.resolve_collection(&request.url).await {
            Ok(collection) => collection,
            Err(e) => return self.abort_collection(&request.url, e, report),
        };

        let folder = self
            .config
            .download_root
            .join(sanitize_collection_title(&collection.title));
        if let Err(e) = tokio::fs::create_dir_all(&folder).await {
            let err = AppError::Io(format!("Failed to create {}: {e}", folder.display()));
            return self.abort_collection(&request.url, err, report);
        }
        info!("Created folder for playlist: {}", folder.display());

        self.control.set_phase(DownloadPhase::CollectionTransfer);
        for (position, item) in collection.items().enumerate() {
            let index = position + 1;
            self.download_item(index, item, &folder, request, resolution, &mut report)
                .await;
        }

        info!(
            "Playlist {} finished: {} downloaded, {} skipped, {} failed",
            collection.title,
            report.completed.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    async fn download_item(
        &self,
        index: usize,
        item: &ItemDescriptor,
        folder: &Path,
        request: &DownloadRequest,
        resolution: Resolution,
        report: &mut SessionReport,
    ) {
        let variants = match self.resolver.list_variants(item).await {
            Ok(variants) => variants,
            Err(e) => {
                warn!("Error resolving video {index} ({}): {e}", item.title);
                self.events.status(format!("Error downloading {}: {e}", item.title));
                self.item_failed(index, item, e, report);
                return;
            }
        };

        let Ok(selection) = self.pick(&variants, resolution, item) else {
            error!("No available streams for {}.", item.title);
            self.events.status(format!("No available streams for {}.", item.title));
            self.events.emit(EngineEvent::ItemSkipped {
                index,
                title: item.title.clone(),
            });
            report.skipped.push(index);
            return;
        };

        let title = numbered_title(index, &item.title, request.number_items);
        info!("Downloading video {index}: {}", item.title);

        match into_result(self.transfer.execute(&selection.variant, folder, &title).await) {
            Ok(path) => {
                self.events.emit(EngineEvent::ItemComplete {
                    index,
                    title: item.title.clone(),
                    path: path.clone(),
                });
                report.completed.push(path);
            }
            Err(e) => self.item_failed(index, item, e, report),
        }
    }

    fn item_failed(
        &self,
        index: usize,
        item: &ItemDescriptor,
        error: AppError,
        report: &mut SessionReport,
    ) {
        self.events.emit(EngineEvent::ItemError {
            index,
            title: item.title.clone(),
            error: error.clone(),
        });
        report.failed.push((index, error));
    }

    fn abort_collection(
        &self,
        url: &str,
        error: AppError,
        mut report: SessionReport,
    ) -> SessionReport {
        error!("Error downloading playlist {url}: {error}");
        self.events.status(format!("Error downloading playlist: {error}"));
        self.events.emit(EngineEvent::DownloadError(error.clone()));
        report.aborted = Some(error);
        report
    }

    /// Selects a variant, announcing a fallback when one was needed.
    fn pick(
        &self,
        variants: &[StreamVariant],
        resolution: Resolution,
        item: &ItemDescriptor,
    ) -> Result<Selection, AppError> {
        let selection = selector::select(variants, resolution)?;
        if selection.is_fallback() {
            let chosen = selection.variant.resolution;
            warn!("Resolution {resolution} not available for {}.", item.title);
            self.events.status(format!(
                "Resolution {resolution} not available for {}. Downloading highest resolution.",
                item.title
            ));
            self.events.emit(EngineEvent::FallbackUsed {
                requested: resolution,
                chosen,
            });
        }
        Ok(selection)
    }
}

fn into_result(outcome: TransferOutcome) -> Result<std::path::PathBuf, AppError> {
    match outcome {
        TransferOutcome::Completed(path) => Ok(path),
        TransferOutcome::Failed(e) => Err(e),
        TransferOutcome::Aborted => Err(AppError::Aborted),
    }
}
