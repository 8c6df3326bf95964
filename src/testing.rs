/// Fakes and fixtures shared by unit and integration tests
use crate::{
    credential::{Argon2CredentialStore, CredentialStore},
    db::account::to_millis,
    error::{HoaxError, HoaxResult},
    file_store::FileStore,
    mailer::EmailGateway,
    session::generate_token,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

/// Secret of every account created by `seed_account`
pub const SEED_PASSWORD: &str = "P4ssword";

/// Insert an account directly, bypassing registration
///
/// Pending accounts get a random activation token.
pub async fn seed_account(
    pool: &SqlitePool,
    handle: &str,
    email: &str,
    pending: bool,
) -> HoaxResult<i64> {
    let password_hash = Argon2CredentialStore::new().hash(SEED_PASSWORD)?;
    let activation_token = pending.then(generate_token);

    let result = sqlx::query(
        "INSERT INTO account (handle, email, password_hash, pending, activation_token, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(handle)
    .bind(email)
    .bind(password_hash)
    .bind(pending)
    .bind(activation_token)
    .bind(to_millis(Utc::now()))
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Kind of message recorded by `RecordingMailer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKind {
    Activation,
    PasswordReset,
}

/// A delivered message
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub kind: SentKind,
    pub to: String,
    pub token: String,
}

/// Email gateway that records messages instead of sending them
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with `EmailDeliveryFailure`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent().len()
    }

    pub fn last_activation_token(&self, to: &str) -> Option<String> {
        self.last_token(SentKind::Activation, to)
    }

    pub fn last_reset_token(&self, to: &str) -> Option<String> {
        self.last_token(SentKind::PasswordReset, to)
    }

    fn last_token(&self, kind: SentKind, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|email| email.kind == kind && email.to == to)
            .map(|email| email.token)
    }

    fn record(&self, kind: SentKind, to: &str, token: &str) -> HoaxResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HoaxError::EmailDeliveryFailure(
                "Recording mailer set to fail".to_string(),
            ));
        }

        let mut sent = self
            .sent
            .lock()
            .map_err(|_| HoaxError::Internal("Mailer lock poisoned".to_string()))?;
        sent.push(SentEmail {
            kind,
            to: to.to_string(),
            token: token.to_string(),
        });

        Ok(())
    }
}

#[async_trait]
impl EmailGateway for RecordingMailer {
    async fn send_account_activation(&self, to_email: &str, token: &str) -> HoaxResult<()> {
        self.record(SentKind::Activation, to_email, token)
    }

    async fn send_password_reset(&self, to_email: &str, token: &str) -> HoaxResult<()> {
        self.record(SentKind::PasswordReset, to_email, token)
    }
}

/// In-memory file store
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write and delete fail with `FileStore`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_failing(&self) -> HoaxResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HoaxError::FileStore("Memory file store set to fail".to_string()));
        }
        Ok(())
    }

    fn files(&self) -> HoaxResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.files
            .lock()
            .map_err(|_| HoaxError::Internal("File store lock poisoned".to_string()))
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, name: &str, data: &[u8]) -> HoaxResult<()> {
        self.check_failing()?;
        self.files()?.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> HoaxResult<Option<Vec<u8>>> {
        Ok(self.files()?.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> HoaxResult<()> {
        self.check_failing()?;
        self.files()?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| HoaxError::NotFound(format!("File {}", name)))
    }

    async fn exists(&self, name: &str) -> HoaxResult<bool> {
        Ok(self.files()?.contains_key(name))
    }
}
