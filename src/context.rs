/// Application context and dependency injection
use crate::{
    account::{
        AccountManager, AccountRepository, ActivationWorkflow, PasswordResetWorkflow,
        SqliteAccountRepository,
    },
    attachment::{AttachmentGarbageCollector, AttachmentService, SqliteAttachmentRepository},
    config::ServerConfig,
    credential::{Argon2CredentialStore, CredentialStore},
    db,
    error::{HoaxError, HoaxResult},
    file_store::{DiskFileStore, FileStore},
    mailer::{EmailGateway, Mailer},
    session::{SessionTokenService, SqliteTokenStore},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub account_db: SqlitePool,
    pub sessions: SessionTokenService,
    pub account_manager: Arc<AccountManager>,
    pub activation: Arc<ActivationWorkflow>,
    pub password_reset: Arc<PasswordResetWorkflow>,
    pub attachments: Arc<AttachmentService>,
    pub attachment_collector: Arc<AttachmentGarbageCollector>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> HoaxResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize account database
        let account_db = db::create_pool(
            &config.storage.account_db,
            db::DatabaseOptions {
                busy_timeout: config.storage.busy_timeout,
                ..Default::default()
            },
        )
        .await?;
        db::run_migrations(&account_db).await?;
        db::test_connection(&account_db).await?;

        let mailer = Mailer::new(
            config.email.clone(),
            config.service.public_url.clone(),
            config.email_timeout,
        )?;
        if !mailer.is_configured() {
            tracing::warn!("SMTP not configured; activation and reset emails will not be sent");
        }
        let mailer: Arc<dyn EmailGateway> = Arc::new(mailer);

        let files: Arc<dyn FileStore> = Arc::new(DiskFileStore::new(
            config.storage.attachment_directory(),
        ));

        Ok(Self::with_components(config, account_db, mailer, files))
    }

    /// Wire services over an existing pool and gateways
    pub fn with_components(
        config: ServerConfig,
        account_db: SqlitePool,
        mailer: Arc<dyn EmailGateway>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        let credentials: Arc<dyn CredentialStore> = Arc::new(Argon2CredentialStore::new());
        let accounts: Arc<dyn AccountRepository> =
            Arc::new(SqliteAccountRepository::new(account_db.clone()));
        let sessions =
            SessionTokenService::new(Arc::new(SqliteTokenStore::new(account_db.clone())));

        let account_manager = Arc::new(AccountManager::new(
            accounts.clone(),
            credentials.clone(),
            sessions.clone(),
        ));
        let activation = Arc::new(
            ActivationWorkflow::new(accounts.clone(), credentials.clone(), mailer.clone())
                .with_send_timeout(config.email_timeout),
        );
        let password_reset = Arc::new(PasswordResetWorkflow::new(
            accounts,
            credentials,
            mailer,
            sessions.clone(),
        ));

        let attachment_records = Arc::new(SqliteAttachmentRepository::new(account_db.clone()));
        let attachments = Arc::new(AttachmentService::new(
            attachment_records.clone(),
            files.clone(),
            config.attachments.max_bytes,
        ));
        let attachment_collector =
            Arc::new(AttachmentGarbageCollector::new(attachment_records, files));

        Self {
            config: Arc::new(config),
            account_db,
            sessions,
            account_manager,
            activation,
            password_reset,
            attachments,
            attachment_collector,
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> HoaxResult<()> {
        let dirs = [
            config.storage.data_directory.clone(),
            config.storage.attachment_directory(),
        ];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    HoaxError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }
}
