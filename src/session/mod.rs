/// Session token management
///
/// Opaque bearer tokens backed by a persistent token store. A token is a pure
/// lookup key, so revocation takes effect on the next request.

mod service;
mod store;

pub use service::SessionTokenService;
pub use store::SqliteTokenStore;

use crate::{db::account::SessionToken, error::HoaxResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};

/// Length of every generated token
pub const TOKEN_LENGTH: usize = 32;

/// Persistent set of issued session tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a token. Returns `false` if the token string is already taken.
    async fn insert(&self, token: &SessionToken) -> HoaxResult<bool>;

    /// Look up a token
    async fn find(&self, token: &str) -> HoaxResult<Option<SessionToken>>;

    /// Delete a token, returning whether it existed
    async fn delete(&self, token: &str) -> HoaxResult<bool>;

    /// Delete every token owned by an account
    async fn delete_for_account(&self, account_id: i64) -> HoaxResult<u64>;

    /// Delete every token issued strictly before `cutoff`
    async fn delete_issued_before(&self, cutoff: DateTime<Utc>) -> HoaxResult<u64>;
}

/// Generate an unguessable alphanumeric token
///
/// Also used for activation and password reset tokens.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
