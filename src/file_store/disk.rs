/// Disk-based file storage backend
use crate::{
    error::{HoaxError, HoaxResult},
    file_store::FileStore,
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores every file flat under one directory. Names are generated by the
/// service, never taken from the client.
#[derive(Clone)]
pub struct DiskFileStore {
    base_path: PathBuf,
}

impl DiskFileStore {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Create the base directory if needed
    pub async fn ensure_directory(&self) -> HoaxResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            HoaxError::FileStore(format!("Failed to create upload directory: {}", e))
        })
    }

    fn get_file_path(&self, name: &str) -> HoaxResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(HoaxError::FileStore(format!("Invalid file name: {}", name)));
        }
        Ok(self.base_path.join(name))
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn put(&self, name: &str, data: &[u8]) -> HoaxResult<()> {
        let path = self.get_file_path(name)?;
        self.ensure_directory().await?;

        fs::write(&path, data)
            .await
            .map_err(|e| HoaxError::FileStore(format!("Failed to write file {}: {}", name, e)))
    }

    async fn get(&self, name: &str) -> HoaxResult<Option<Vec<u8>>> {
        let path = self.get_file_path(name)?;

        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HoaxError::FileStore(format!(
                "Failed to read file {}: {}",
                name, e
            ))),
        }
    }

    async fn delete(&self, name: &str) -> HoaxResult<()> {
        let path = self.get_file_path(name)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(HoaxError::NotFound(format!("File {}", name)))
            }
            Err(e) => Err(HoaxError::FileStore(format!(
                "Failed to delete file {}: {}",
                name, e
            ))),
        }
    }

    async fn exists(&self, name: &str) -> HoaxResult<bool> {
        let path = self.get_file_path(name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}
