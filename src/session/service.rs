/// Issue, verify and revoke opaque session tokens
use crate::{
    db::account::SessionToken,
    error::{HoaxError, HoaxResult},
    session::{generate_token, TokenStore},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Session token service
///
/// Tokens are immutable once issued; they only ever leave the store through
/// `revoke`, `revoke_all` or `sweep_expired`.
#[derive(Clone)]
pub struct SessionTokenService {
    store: Arc<dyn TokenStore>,
    generator: fn() -> String,
}

impl SessionTokenService {
    /// Create a new session token service
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self::with_generator(store, generate_token)
    }

    /// Create a service with a custom token generator
    pub fn with_generator(store: Arc<dyn TokenStore>, generator: fn() -> String) -> Self {
        Self { store, generator }
    }

    /// Issue a new token for an account
    pub async fn issue(&self, account_id: i64) -> HoaxResult<String> {
        // A collision is retried once with a fresh token
        for _ in 0..2 {
            let record = SessionToken {
                token: (self.generator)(),
                account_id,
                issued_at: Utc::now(),
            };

            if self.store.insert(&record).await? {
                tracing::debug!(account_id, "Issued session token");
                return Ok(record.token);
            }

            tracing::warn!(account_id, "Session token collision, regenerating");
        }

        Err(HoaxError::Internal(
            "Could not generate a unique session token".to_string(),
        ))
    }

    /// Resolve a token to its owning account id
    pub async fn verify(&self, token: &str) -> HoaxResult<i64> {
        self.store
            .find(token)
            .await?
            .map(|record| record.account_id)
            .ok_or(HoaxError::AuthenticationFailure)
    }

    /// Revoke a single token. Unknown tokens are not an error.
    pub async fn revoke(&self, token: &str) -> HoaxResult<()> {
        if !self.store.delete(token).await? {
            tracing::debug!("Revoke requested for unknown session token");
        }

        Ok(())
    }

    /// Revoke every token owned by an account
    pub async fn revoke_all(&self, account_id: i64) -> HoaxResult<u64> {
        let revoked = self.store.delete_for_account(account_id).await?;
        tracing::info!(account_id, revoked, "Revoked all sessions for account");

        Ok(revoked)
    }

    /// Delete tokens issued more than `max_age` before `now`
    pub async fn sweep_expired(&self, now: DateTime<Utc>, max_age: Duration) -> HoaxResult<u64> {
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| HoaxError::Internal(format!("Invalid session lifetime: {}", e)))?;

        let deleted = self.store.delete_issued_before(now - max_age).await?;

        if deleted > 0 {
            tracing::info!(deleted, "Swept expired session tokens");
        } else {
            tracing::debug!("Session sweep: no expired tokens found");
        }

        Ok(deleted)
    }
}
