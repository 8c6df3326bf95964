/// SQLite-backed token store
use crate::{
    db::account::{from_millis, to_millis, SessionToken},
    error::{is_unique_violation, HoaxResult},
    session::TokenStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// Token store persisted in the `session_token` table
#[derive(Clone)]
pub struct SqliteTokenStore {
    db: SqlitePool,
}

impl SqliteTokenStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn insert(&self, token: &SessionToken) -> HoaxResult<bool> {
        let result = sqlx::query(
            "INSERT INTO session_token (token, account_id, issued_at) VALUES (?1, ?2, ?3)",
        )
        .bind(&token.token)
        .bind(token.account_id)
        .bind(to_millis(token.issued_at))
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, token: &str) -> HoaxResult<Option<SessionToken>> {
        let row = sqlx::query(
            "SELECT token, account_id, issued_at FROM session_token WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(Some(SessionToken {
                token: row.try_get("token")?,
                account_id: row.try_get("account_id")?,
                issued_at: from_millis(row.try_get("issued_at")?),
            })),
            None => Ok(None),
        }
    }

    async fn delete(&self, token: &str) -> HoaxResult<bool> {
        let result = sqlx::query("DELETE FROM session_token WHERE token = ?1")
            .bind(token)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_account(&self, account_id: i64) -> HoaxResult<u64> {
        let result = sqlx::query("DELETE FROM session_token WHERE account_id = ?1")
            .bind(account_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_issued_before(&self, cutoff: DateTime<Utc>) -> HoaxResult<u64> {
        let result = sqlx::query("DELETE FROM session_token WHERE issued_at < ?1")
            .bind(to_millis(cutoff))
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
