/// Reclaim attachments that were never associated with a post
use crate::{
    attachment::AttachmentRepository,
    error::{HoaxError, HoaxResult},
    file_store::FileStore,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AttachmentGarbageCollector {
    attachments: Arc<dyn AttachmentRepository>,
    files: Arc<dyn FileStore>,
}

impl AttachmentGarbageCollector {
    pub fn new(attachments: Arc<dyn AttachmentRepository>, files: Arc<dyn FileStore>) -> Self {
        Self { attachments, files }
    }

    /// Delete orphans uploaded more than `retention` before `now`
    ///
    /// Each orphan is handled on its own: the file is removed first, then the
    /// record. Failures are logged and the item is left for the next sweep.
    /// Returns the number of records removed.
    pub async fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> HoaxResult<u64> {
        let retention = chrono::Duration::from_std(retention)
            .map_err(|e| HoaxError::Internal(format!("Invalid attachment retention: {}", e)))?;

        let orphans = self.attachments.list_orphans(now - retention).await?;
        let mut reclaimed = 0u64;

        for orphan in orphans {
            match self.files.delete(&orphan.name).await {
                Ok(()) => {}
                // Left behind by an earlier sweep that removed the file only
                Err(HoaxError::NotFound(_)) => {
                    tracing::debug!(attachment_id = orphan.id, "Orphan file already gone");
                }
                Err(e) => {
                    tracing::warn!(
                        attachment_id = orphan.id,
                        "Failed to delete orphan file {}: {}",
                        orphan.name,
                        e
                    );
                    continue;
                }
            }

            match self.attachments.delete_orphan(orphan.id).await {
                Ok(true) => reclaimed += 1,
                Ok(false) => {
                    tracing::warn!(
                        attachment_id = orphan.id,
                        "Orphan was associated during sweep after its file was removed"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        attachment_id = orphan.id,
                        "Failed to delete orphan record: {}",
                        e
                    );
                }
            }
        }

        if reclaimed > 0 {
            tracing::info!(reclaimed, "Swept orphaned attachments");
        } else {
            tracing::debug!("Attachment sweep: no orphans reclaimed");
        }

        Ok(reclaimed)
    }
}
