/// Background task implementations
use crate::{context::AppContext, error::HoaxResult};
use chrono::Utc;

/// Remove session tokens older than the configured lifetime
pub async fn cleanup_expired_sessions(ctx: &AppContext) -> HoaxResult<u64> {
    ctx.sessions
        .sweep_expired(Utc::now(), ctx.config.session.lifetime)
        .await
}

/// Remove attachments never associated within the retention window
pub async fn cleanup_orphaned_attachments(ctx: &AppContext) -> HoaxResult<u64> {
    ctx.attachment_collector
        .sweep(Utc::now(), ctx.config.attachments.retention)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ServerConfig,
        db::{self, account::SessionToken},
        session::{SqliteTokenStore, TokenStore},
        testing::{self, MemoryFileStore, RecordingMailer},
    };
    use chrono::Duration;
    use std::{path::PathBuf, sync::Arc};

    async fn create_test_context() -> AppContext {
        let config = ServerConfig::for_data_directory(PathBuf::from("unused"));
        AppContext::with_components(
            config,
            db::memory_pool().await.unwrap(),
            Arc::new(RecordingMailer::new()),
            Arc::new(MemoryFileStore::new()),
        )
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let ctx = create_test_context().await;
        let account_id = testing::seed_account(&ctx.account_db, "user1", "user1@mail.com", false)
            .await
            .unwrap();

        let store = SqliteTokenStore::new(ctx.account_db.clone());
        store
            .insert(&SessionToken {
                token: "expired".to_string(),
                account_id,
                issued_at: Utc::now() - Duration::days(8),
            })
            .await
            .unwrap();
        let live = ctx.sessions.issue(account_id).await.unwrap();

        assert_eq!(cleanup_expired_sessions(&ctx).await.unwrap(), 1);
        assert!(ctx.sessions.verify("expired").await.is_err());
        assert_eq!(ctx.sessions.verify(&live).await.unwrap(), account_id);
    }

    #[tokio::test]
    async fn test_cleanup_orphaned_attachments_keeps_fresh_uploads() {
        let ctx = create_test_context().await;
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

        let attachment = ctx.attachments.upload(&png).await.unwrap();

        assert_eq!(cleanup_orphaned_attachments(&ctx).await.unwrap(), 0);
        assert!(ctx.attachments.associate(attachment.id, 1).await.unwrap());
    }
}
