/// Registration with email-gated activation
use crate::{
    account::AccountRepository,
    credential::CredentialStore,
    db::account::NewAccount,
    error::{HoaxError, HoaxResult},
    mailer::EmailGateway,
    session::generate_token,
};
use std::{sync::Arc, time::Duration};

/// Bound on the activation email while the registration insert is uncommitted
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(3);

/// Creates pending accounts and redeems activation tokens
#[derive(Clone)]
pub struct ActivationWorkflow {
    accounts: Arc<dyn AccountRepository>,
    credentials: Arc<dyn CredentialStore>,
    mailer: Arc<dyn EmailGateway>,
    send_timeout: Duration,
}

impl ActivationWorkflow {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        credentials: Arc<dyn CredentialStore>,
        mailer: Arc<dyn EmailGateway>,
    ) -> Self {
        Self {
            accounts,
            credentials,
            mailer,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Register a new pending account
    ///
    /// The account row is only committed once the activation email has been
    /// handed to the gateway. A delivery failure rolls the insert back, and so
    /// does a gateway that has not answered within the send timeout: the open
    /// insert holds the database write lock until then.
    pub async fn register(&self, handle: &str, email: &str, secret: &str) -> HoaxResult<()> {
        let password_hash = self.credentials.hash(secret)?;
        let activation_token = generate_token();

        let scope = self
            .accounts
            .begin_registration(NewAccount {
                handle: handle.to_string(),
                email: email.to_string(),
                password_hash,
                activation_token: activation_token.clone(),
            })
            .await?;
        let account_id = scope.account_id();

        let delivery = tokio::time::timeout(
            self.send_timeout,
            self.mailer.send_account_activation(email, &activation_token),
        )
        .await
        .unwrap_or_else(|_| {
            Err(HoaxError::EmailDeliveryFailure(format!(
                "Activation email timed out after {:?}",
                self.send_timeout
            )))
        });

        match delivery {
            Ok(()) => {
                scope.commit().await?;
                tracing::info!(account_id, handle, "Registered pending account");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = scope.rollback().await {
                    tracing::error!("Failed to roll back registration: {}", rollback_err);
                }
                tracing::warn!(handle, "Activation email failed, registration rolled back: {}", e);

                Err(match e {
                    HoaxError::EmailDeliveryFailure(_) => e,
                    other => HoaxError::EmailDeliveryFailure(other.to_string()),
                })
            }
        }
    }

    /// Redeem an activation token
    ///
    /// Unknown and already consumed tokens both fail with `InvalidToken`.
    pub async fn activate(&self, token: &str) -> HoaxResult<()> {
        if self.accounts.find_by_activation_token(token).await?.is_none() {
            return Err(HoaxError::InvalidToken);
        }

        // A concurrent redemption may win between the lookup and the write
        match self.accounts.activate(token).await? {
            Some(account_id) => {
                tracing::info!(account_id, "Account activated");
                Ok(())
            }
            None => Err(HoaxError::InvalidToken),
        }
    }
}
