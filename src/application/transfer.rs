use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{AppError, StreamVariant, TransferOutcome},
    utils::{final_name_from_staging, staging_file_name},
};

use super::{
    events::{EngineEvent, EventSink},
    session::SessionControl,
};

/// Writes a variant to `.pending-<name>`, waits on the pause gate, then renames it.
#[derive(Debug, Clone)]
pub struct TransferController {
    control: SessionControl,
    events: EventSink,
}

impl TransferController {
    pub fn new(control: SessionControl, events: EventSink) -> Self {
        Self { control, events }
    }

    pub async fn execute(
        &self,
        variant: &StreamVariant,
        destination: &Path,
        title: &str,
    ) -> TransferOutcome {
        if !self.control.is_active() {
            warn!("Transfer for {title} requested outside an active session");
            return TransferOutcome::Aborted;
        }

        let staging_name = staging_file_name(title, &variant.extension);
        let staging_path = destination.join(&staging_name);
        self.events.status(format!("Downloading: {title}"));
        debug!("Downloading stream to {}", staging_path.display());

        match self.copy_to(variant, &staging_path).await {
            Ok(bytes) => debug!("Wrote {bytes} bytes to {}", staging_path.display()),
            Err(e) => {
                if tokio::fs::remove_file(&staging_path).await.is_err() {
                    debug!("No staging file to clean up at {}", staging_path.display());
                }
                error!("Error downloading file: {e}");
                self.events.status(format!("Error downloading: {e}"));
                return TransferOutcome::Failed(e);
            }
        }

        let still_active = self.control.wait_until_resumed().await;

        let final_name = final_name_from_staging(&staging_name).to_string();
        let final_path: PathBuf = destination.join(&final_name);
        if let Err(e) = tokio::fs::rename(&staging_path, &final_path).await {
            error!("Error renaming {}: {e}", staging_path.display());
            let err = AppError::Io(format!("Failed to finalize {final_name}: {e}"));
            self.events.status(format!("Error downloading: {err}"));
            return TransferOutcome::Failed(err);
        }

        if still_active {
            info!("Download complete: {final_name}");
            self.events.status(format!("Download complete: {final_name}"));
        } else {
            info!("Downloaded: {final_name}");
            self.events.status(format!("Downloaded: {final_name}"));
        }

        TransferOutcome::Completed(final_path)
    }

    async fn copy_to(&self, variant: &StreamVariant, path: &Path) -> Result<u64, AppError> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| AppError::Io(format!("Failed to create file: {e}")))?;

        let (total, mut stream) = variant.source.open().await?;
        self.events.emit(EngineEvent::Progress {
            downloaded: 0,
            total,
        });

        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Io(format!("Write error: {e}")))?;

            downloaded += chunk.len() as u64;
            self.events.emit(EngineEvent::Progress { downloaded, total });
        }

        file.sync_all()
            .await
            .map_err(|e| AppError::Io(format!("Failed to sync file: {e}")))?;

        Ok(downloaded)
    }
}
