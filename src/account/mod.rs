/// Account management system
///
/// Registration with email-gated activation, login/logout, and self-service
/// password reset. Persistence goes through the `AccountRepository` seam.

mod activation;
mod manager;
mod password_reset;
mod repository;

pub use activation::ActivationWorkflow;
pub use manager::AccountManager;
pub use password_reset::PasswordResetWorkflow;
pub use repository::SqliteAccountRepository;

use crate::{
    db::account::{Account, NewAccount},
    error::HoaxResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persistence of account records
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a pending account inside an uncommitted write scope.
    ///
    /// Fails with `AlreadyInUse` when the handle or email is taken.
    async fn begin_registration(&self, account: NewAccount)
        -> HoaxResult<Box<dyn RegistrationScope>>;

    async fn find_by_id(&self, id: i64) -> HoaxResult<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> HoaxResult<Option<Account>>;

    async fn find_by_activation_token(&self, token: &str) -> HoaxResult<Option<Account>>;

    async fn find_by_reset_token(&self, token: &str) -> HoaxResult<Option<Account>>;

    /// Consume an activation token: clears it and the pending flag in one
    /// conditional write. Returns the activated account id, or `None` if no
    /// account currently holds the token.
    async fn activate(&self, token: &str) -> HoaxResult<Option<i64>>;

    /// Store a reset token on an account, overwriting any previous one.
    /// Returns `false` if the token string is already held by another account.
    async fn set_reset_token(&self, account_id: i64, token: &str) -> HoaxResult<bool>;

    /// Consume a reset token: replaces the password hash, clears the reset
    /// token and any pending activation in one conditional write. Returns the
    /// account id, or `None` if no account holds the token.
    async fn complete_password_reset(
        &self,
        reset_token: &str,
        password_hash: &str,
    ) -> HoaxResult<Option<i64>>;
}

/// An inserted but not yet committed registration
///
/// Dropping the scope without committing discards the account.
#[async_trait]
pub trait RegistrationScope: Send {
    /// Id assigned to the pending account
    fn account_id(&self) -> i64;

    async fn commit(self: Box<Self>) -> HoaxResult<()>;

    async fn rollback(self: Box<Self>) -> HoaxResult<()>;
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: i64,
    #[serde(rename = "username")]
    pub handle: String,
    pub token: String,
}

/// Password reset request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Password reset confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdateRequest {
    pub password_reset_token: String,
    pub password: String,
}

/// Generic message response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
