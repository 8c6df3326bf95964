/// Attachment upload and association
use crate::{
    attachment::{AttachmentRepository, FileAttachment},
    error::{HoaxError, HoaxResult},
    file_store::FileStore,
};
use chrono::Utc;
use image::ImageFormat;
use std::sync::Arc;
use uuid::Uuid;

/// Detect the content type of an upload from its leading bytes
///
/// Only PNG, JPEG, GIF and PDF are accepted.
pub fn detect_file_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"%PDF") {
        return Some("application/pdf");
    }

    match image::guess_format(data) {
        Ok(ImageFormat::Png) => Some("image/png"),
        Ok(ImageFormat::Jpeg) => Some("image/jpeg"),
        Ok(ImageFormat::Gif) => Some("image/gif"),
        _ => None,
    }
}

/// Attachment service
#[derive(Clone)]
pub struct AttachmentService {
    attachments: Arc<dyn AttachmentRepository>,
    files: Arc<dyn FileStore>,
    max_bytes: usize,
}

impl AttachmentService {
    pub fn new(
        attachments: Arc<dyn AttachmentRepository>,
        files: Arc<dyn FileStore>,
        max_bytes: usize,
    ) -> Self {
        Self {
            attachments,
            files,
            max_bytes,
        }
    }

    /// Store an upload as an unassociated attachment
    pub async fn upload(&self, data: &[u8]) -> HoaxResult<FileAttachment> {
        if data.len() > self.max_bytes {
            return Err(HoaxError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let file_type = detect_file_type(data).ok_or(HoaxError::UnsupportedType)?;
        let name = Uuid::new_v4().simple().to_string();

        self.files.put(&name, data).await?;

        match self.attachments.insert(&name, file_type, Utc::now()).await {
            Ok(attachment) => {
                tracing::debug!(
                    attachment_id = attachment.id,
                    file_type,
                    size = data.len(),
                    "Stored attachment"
                );
                Ok(attachment)
            }
            Err(e) => {
                if let Err(cleanup_err) = self.files.delete(&name).await {
                    tracing::warn!("Failed to remove attachment file {}: {}", name, cleanup_err);
                }
                Err(e)
            }
        }
    }

    /// Link an attachment to a post
    ///
    /// A missing or already associated attachment is left untouched.
    pub async fn associate(&self, attachment_id: i64, post_id: i64) -> HoaxResult<bool> {
        let won = self.attachments.associate(attachment_id, post_id).await?;

        if !won {
            tracing::debug!(
                attachment_id,
                post_id,
                "Attachment missing or already associated"
            );
        }

        Ok(won)
    }
}
