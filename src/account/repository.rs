/// SQLite account repository using runtime queries
use crate::{
    account::{AccountRepository, RegistrationScope},
    db::account::{from_millis, to_millis, Account, NewAccount},
    error::{is_unique_violation, HoaxError, HoaxResult},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqlitePool, Transaction};

const ACCOUNT_COLUMNS: &str = "id, handle, email, password_hash, pending, activation_token, \
                               reset_token, image, created_at";

/// Account repository persisted in the `account` table
#[derive(Clone)]
pub struct SqliteAccountRepository {
    db: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn find_by(&self, column: &str, value: &str) -> HoaxResult<Option<Account>> {
        let sql = format!("SELECT {} FROM account WHERE {} = ?1", ACCOUNT_COLUMNS, column);

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }
}

fn account_from_row(row: &SqliteRow) -> HoaxResult<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        handle: row.try_get("handle")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        pending: row.try_get("pending")?,
        activation_token: row.try_get("activation_token")?,
        reset_token: row.try_get("reset_token")?,
        image: row.try_get("image")?,
        created_at: from_millis(row.try_get("created_at")?),
    })
}

/// Name the column behind a unique violation, e.g. `email` from
/// "UNIQUE constraint failed: account.email"
fn violated_column(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .message()
            .rsplit_once("account.")
            .map(|(_, column)| column.trim().to_string()),
        _ => None,
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn begin_registration(
        &self,
        account: NewAccount,
    ) -> HoaxResult<Box<dyn RegistrationScope>> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            "INSERT INTO account (handle, email, password_hash, pending, activation_token, created_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5)",
        )
        .bind(&account.handle)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.activation_token)
        .bind(to_millis(Utc::now()))
        .execute(&mut *tx)
        .await;

        let account_id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return match violated_column(&e).as_deref() {
                    Some(column @ ("email" | "handle")) => {
                        Err(HoaxError::AlreadyInUse(column.to_string()))
                    }
                    _ => Err(HoaxError::Internal(format!(
                        "Registration conflict: {}",
                        e
                    ))),
                };
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Box::new(SqliteRegistrationScope { tx, account_id }))
    }

    async fn find_by_id(&self, id: i64) -> HoaxResult<Option<Account>> {
        let sql = format!("SELECT {} FROM account WHERE id = ?1", ACCOUNT_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> HoaxResult<Option<Account>> {
        self.find_by("email", email).await
    }

    async fn find_by_activation_token(&self, token: &str) -> HoaxResult<Option<Account>> {
        self.find_by("activation_token", token).await
    }

    async fn find_by_reset_token(&self, token: &str) -> HoaxResult<Option<Account>> {
        self.find_by("reset_token", token).await
    }

    async fn activate(&self, token: &str) -> HoaxResult<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar(
            "UPDATE account SET pending = 0, activation_token = NULL
             WHERE activation_token = ?1
             RETURNING id",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        Ok(id)
    }

    async fn set_reset_token(&self, account_id: i64, token: &str) -> HoaxResult<bool> {
        let result = sqlx::query("UPDATE account SET reset_token = ?1 WHERE id = ?2")
            .bind(token)
            .bind(account_id)
            .execute(&self.db)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                Err(HoaxError::NotFound(format!("Account {}", account_id)))
            }
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn complete_password_reset(
        &self,
        reset_token: &str,
        password_hash: &str,
    ) -> HoaxResult<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar(
            "UPDATE account
             SET password_hash = ?1, reset_token = NULL, pending = 0, activation_token = NULL
             WHERE reset_token = ?2
             RETURNING id",
        )
        .bind(password_hash)
        .bind(reset_token)
        .fetch_optional(&self.db)
        .await?;

        Ok(id)
    }
}

/// Registration write scope backed by an open transaction
struct SqliteRegistrationScope {
    tx: Transaction<'static, Sqlite>,
    account_id: i64,
}

#[async_trait]
impl RegistrationScope for SqliteRegistrationScope {
    fn account_id(&self) -> i64 {
        self.account_id
    }

    async fn commit(self: Box<Self>) -> HoaxResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> HoaxResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn create_test_repository() -> SqliteAccountRepository {
        SqliteAccountRepository::new(db::memory_pool().await.unwrap())
    }

    fn new_account(handle: &str, email: &str, token: &str) -> NewAccount {
        NewAccount {
            handle: handle.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            activation_token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn test_committed_registration_is_pending() {
        let repo = create_test_repository().await;

        let scope = repo
            .begin_registration(new_account("user1", "user1@mail.com", "tok1"))
            .await
            .unwrap();
        let id = scope.account_id();
        scope.commit().await.unwrap();

        let account = repo.find_by_id(id).await.unwrap().unwrap();
        assert!(account.pending);
        assert_eq!(account.activation_token.as_deref(), Some("tok1"));
        assert_eq!(account.reset_token, None);
    }

    #[tokio::test]
    async fn test_rolled_back_registration_leaves_nothing() {
        let repo = create_test_repository().await;

        let scope = repo
            .begin_registration(new_account("user1", "user1@mail.com", "tok1"))
            .await
            .unwrap();
        scope.rollback().await.unwrap();

        assert!(repo.find_by_email("user1@mail.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_registration_leaves_nothing() {
        let repo = create_test_repository().await;

        let scope = repo
            .begin_registration(new_account("user1", "user1@mail.com", "tok1"))
            .await
            .unwrap();
        drop(scope);

        assert!(repo.find_by_email("user1@mail.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_already_in_use() {
        let repo = create_test_repository().await;

        repo.begin_registration(new_account("user1", "user1@mail.com", "tok1"))
            .await
            .unwrap()
            .commit()
            .await
            .unwrap();

        let result = repo
            .begin_registration(new_account("user2", "user1@mail.com", "tok2"))
            .await;
        assert!(matches!(result, Err(HoaxError::AlreadyInUse(ref c)) if c == "email"));
    }

    #[tokio::test]
    async fn test_activate_consumes_token_once() {
        let repo = create_test_repository().await;

        let scope = repo
            .begin_registration(new_account("user1", "user1@mail.com", "tok1"))
            .await
            .unwrap();
        let id = scope.account_id();
        scope.commit().await.unwrap();

        assert_eq!(repo.activate("tok1").await.unwrap(), Some(id));
        assert_eq!(repo.activate("tok1").await.unwrap(), None);

        let account = repo.find_by_id(id).await.unwrap().unwrap();
        assert!(!account.pending);
        assert_eq!(account.activation_token, None);
    }

    #[tokio::test]
    async fn test_reset_token_unique_across_accounts() {
        let repo = create_test_repository().await;

        for (handle, email, token) in [("user1", "user1@mail.com", "a1"), ("user2", "user2@mail.com", "a2")] {
            repo.begin_registration(new_account(handle, email, token))
                .await
                .unwrap()
                .commit()
                .await
                .unwrap();
        }
        let first = repo.find_by_email("user1@mail.com").await.unwrap().unwrap();
        let second = repo.find_by_email("user2@mail.com").await.unwrap().unwrap();

        assert!(repo.set_reset_token(first.id, "reset").await.unwrap());
        assert!(!repo.set_reset_token(second.id, "reset").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_reset_token_for_missing_account() {
        let repo = create_test_repository().await;

        let result = repo.set_reset_token(42, "reset").await;
        assert!(matches!(result, Err(HoaxError::NotFound(_))));
    }
}
