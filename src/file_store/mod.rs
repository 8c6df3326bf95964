/// Binary file storage
///
/// Attachment bytes live outside the database and are addressed by the
/// generated filename stored on the attachment record.

pub mod disk;

pub use disk::DiskFileStore;

use crate::error::HoaxResult;
use async_trait::async_trait;

/// File storage backend trait
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write a file, replacing any previous content under the same name
    async fn put(&self, name: &str, data: &[u8]) -> HoaxResult<()>;

    /// Read a file
    async fn get(&self, name: &str) -> HoaxResult<Option<Vec<u8>>>;

    /// Delete a file. A missing file is reported as `NotFound`.
    async fn delete(&self, name: &str) -> HoaxResult<()>;

    /// Check if a file exists
    async fn exists(&self, name: &str) -> HoaxResult<bool>;
}
