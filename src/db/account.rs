/// Account database models
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Account record in the database
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub handle: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Registered but not yet activated
    pub pending: bool,
    #[serde(skip_serializing)]
    pub activation_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a pending account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub activation_token: String,
}

/// Session token record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub account_id: i64,
    pub issued_at: DateTime<Utc>,
}

/// Timestamps are stored as unix milliseconds
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
