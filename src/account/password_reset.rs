/// Self-service password reset
use crate::{
    account::AccountRepository,
    credential::CredentialStore,
    error::{HoaxError, HoaxResult},
    mailer::EmailGateway,
    session::{generate_token, SessionTokenService},
};
use std::sync::Arc;

/// Issues single-use reset tokens and applies new secrets
#[derive(Clone)]
pub struct PasswordResetWorkflow {
    accounts: Arc<dyn AccountRepository>,
    credentials: Arc<dyn CredentialStore>,
    mailer: Arc<dyn EmailGateway>,
    sessions: SessionTokenService,
}

impl PasswordResetWorkflow {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        credentials: Arc<dyn CredentialStore>,
        mailer: Arc<dyn EmailGateway>,
        sessions: SessionTokenService,
    ) -> Self {
        Self {
            accounts,
            credentials,
            mailer,
            sessions,
        }
    }

    /// Issue a reset token for the account registered under `email`
    ///
    /// Any previous reset token is overwritten. If delivery fails the new token
    /// stays on the account and the request may simply be repeated.
    pub async fn request(&self, email: &str) -> HoaxResult<()> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(HoaxError::UnknownEmail)?;

        let reset_token = self.assign_reset_token(account.id).await?;

        self.mailer
            .send_password_reset(&account.email, &reset_token)
            .await
            .map_err(|e| match e {
                HoaxError::EmailDeliveryFailure(_) => e,
                other => HoaxError::EmailDeliveryFailure(other.to_string()),
            })?;

        tracing::info!(account_id = account.id, "Password reset requested");
        Ok(())
    }

    async fn assign_reset_token(&self, account_id: i64) -> HoaxResult<String> {
        for _ in 0..2 {
            let token = generate_token();
            if self.accounts.set_reset_token(account_id, &token).await? {
                return Ok(token);
            }
            tracing::warn!(account_id, "Reset token collision, regenerating");
        }

        Err(HoaxError::Internal(
            "Could not generate a unique reset token".to_string(),
        ))
    }

    /// Replace the secret of the account holding `reset_token`
    ///
    /// Also finalizes a pending activation, since the reset email proved
    /// ownership of the address. All existing sessions are revoked.
    pub async fn confirm(&self, reset_token: &str, new_secret: &str) -> HoaxResult<()> {
        if self
            .accounts
            .find_by_reset_token(reset_token)
            .await?
            .is_none()
        {
            return Err(HoaxError::InvalidResetToken);
        }

        let password_hash = self.credentials.hash(new_secret)?;

        let account_id = self
            .accounts
            .complete_password_reset(reset_token, &password_hash)
            .await?
            .ok_or(HoaxError::InvalidResetToken)?;

        self.sessions.revoke_all(account_id).await?;

        tracing::info!(account_id, "Password reset completed");
        Ok(())
    }
}
