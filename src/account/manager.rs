/// Login and logout
use crate::{
    account::{AccountRepository, LoginResponse},
    credential::CredentialStore,
    error::{HoaxError, HoaxResult},
    session::SessionTokenService,
};
use std::sync::Arc;

/// Account manager service
#[derive(Clone)]
pub struct AccountManager {
    accounts: Arc<dyn AccountRepository>,
    credentials: Arc<dyn CredentialStore>,
    sessions: SessionTokenService,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        credentials: Arc<dyn CredentialStore>,
        sessions: SessionTokenService,
    ) -> Self {
        Self {
            accounts,
            credentials,
            sessions,
        }
    }

    /// Authenticate with email and secret, issuing a session token
    pub async fn login(&self, email: &str, secret: &str) -> HoaxResult<LoginResponse> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(HoaxError::AuthenticationFailure)?;

        if !self.credentials.verify(secret, &account.password_hash) {
            tracing::debug!(account_id = account.id, "Login rejected: bad credentials");
            return Err(HoaxError::AuthenticationFailure);
        }

        // Checked after the secret so inactivity is only revealed to the owner
        if account.pending {
            return Err(HoaxError::AccountInactive);
        }

        let token = self.sessions.issue(account.id).await?;
        tracing::info!(account_id = account.id, "User logged in");

        Ok(LoginResponse {
            id: account.id,
            handle: account.handle,
            token,
        })
    }

    /// Revoke the presented token, if any
    pub async fn logout(&self, token: Option<&str>) -> HoaxResult<()> {
        if let Some(token) = token {
            self.sessions.revoke(token).await?;
        }

        Ok(())
    }
}
