/// File attachments for hoaxes
///
/// Uploads are stored before the hoax that references them exists; a record
/// with no owning post is an orphan until associated, and orphans past the
/// retention window are reclaimed by the garbage collector.

mod collector;
mod repository;
mod service;

pub use collector::AttachmentGarbageCollector;
pub use repository::SqliteAttachmentRepository;
pub use service::{detect_file_type, AttachmentService};

use crate::error::HoaxResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attachment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub id: i64,
    /// Name of the stored file in the file store
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub file_type: String,
    /// Set at most once
    pub owning_post_id: Option<i64>,
}

/// Persistence of attachment records
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Insert an unassociated record
    async fn insert(
        &self,
        name: &str,
        file_type: &str,
        uploaded_at: DateTime<Utc>,
    ) -> HoaxResult<FileAttachment>;

    async fn find(&self, id: i64) -> HoaxResult<Option<FileAttachment>>;

    /// Set the owning post if none is set yet. Returns whether this call won.
    async fn associate(&self, id: i64, post_id: i64) -> HoaxResult<bool>;

    /// Unassociated records uploaded strictly before `cutoff`
    async fn list_orphans(&self, cutoff: DateTime<Utc>) -> HoaxResult<Vec<FileAttachment>>;

    /// Delete a record only while it is still unassociated
    async fn delete_orphan(&self, id: i64) -> HoaxResult<bool>;
}

/// Upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentUploadResponse {
    pub id: i64,
}
