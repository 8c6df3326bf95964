/// SQLite attachment repository
use crate::{
    attachment::{AttachmentRepository, FileAttachment},
    db::account::{from_millis, to_millis},
    error::HoaxResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

#[derive(Clone)]
pub struct SqliteAttachmentRepository {
    db: SqlitePool,
}

impl SqliteAttachmentRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn attachment_from_row(row: &SqliteRow) -> HoaxResult<FileAttachment> {
    Ok(FileAttachment {
        id: row.try_get("id")?,
        name: row.try_get("filename")?,
        uploaded_at: from_millis(row.try_get("uploaded_at")?),
        file_type: row.try_get("file_type")?,
        owning_post_id: row.try_get("owning_post_id")?,
    })
}

#[async_trait]
impl AttachmentRepository for SqliteAttachmentRepository {
    async fn insert(
        &self,
        name: &str,
        file_type: &str,
        uploaded_at: DateTime<Utc>,
    ) -> HoaxResult<FileAttachment> {
        let result = sqlx::query(
            "INSERT INTO file_attachment (filename, uploaded_at, file_type) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(to_millis(uploaded_at))
        .bind(file_type)
        .execute(&self.db)
        .await?;

        Ok(FileAttachment {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            uploaded_at: from_millis(to_millis(uploaded_at)),
            file_type: file_type.to_string(),
            owning_post_id: None,
        })
    }

    async fn find(&self, id: i64) -> HoaxResult<Option<FileAttachment>> {
        let row = sqlx::query(
            "SELECT id, filename, uploaded_at, file_type, owning_post_id
             FROM file_attachment WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(attachment_from_row).transpose()
    }

    async fn associate(&self, id: i64, post_id: i64) -> HoaxResult<bool> {
        let result = sqlx::query(
            "UPDATE file_attachment SET owning_post_id = ?1
             WHERE id = ?2 AND owning_post_id IS NULL",
        )
        .bind(post_id)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_orphans(&self, cutoff: DateTime<Utc>) -> HoaxResult<Vec<FileAttachment>> {
        let rows = sqlx::query(
            "SELECT id, filename, uploaded_at, file_type, owning_post_id
             FROM file_attachment
             WHERE owning_post_id IS NULL AND uploaded_at < ?1
             ORDER BY uploaded_at",
        )
        .bind(to_millis(cutoff))
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(attachment_from_row).collect()
    }

    async fn delete_orphan(&self, id: i64) -> HoaxResult<bool> {
        let result =
            sqlx::query("DELETE FROM file_attachment WHERE id = ?1 AND owning_post_id IS NULL")
                .bind(id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::Duration;
    use tempfile::TempDir;

    async fn create_test_repository() -> SqliteAttachmentRepository {
        SqliteAttachmentRepository::new(db::memory_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_first_association_wins() {
        let repo = create_test_repository().await;
        let attachment = repo.insert("abc", "image/png", Utc::now()).await.unwrap();

        assert!(repo.associate(attachment.id, 10).await.unwrap());
        assert!(!repo.associate(attachment.id, 11).await.unwrap());

        let stored = repo.find(attachment.id).await.unwrap().unwrap();
        assert_eq!(stored.owning_post_id, Some(10));
    }

    #[tokio::test]
    async fn test_associate_missing_record() {
        let repo = create_test_repository().await;
        assert!(!repo.associate(7, 10).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_association_records_one_owner() {
        // Separate pooled connections so the updates genuinely contend
        let temp_dir = TempDir::new().unwrap();
        let pool = db::create_pool(
            &temp_dir.path().join("account.sqlite"),
            db::DatabaseOptions::default(),
        )
        .await
        .unwrap();
        db::run_migrations(&pool).await.unwrap();
        let repo = SqliteAttachmentRepository::new(pool);

        for round in 0..20 {
            let name = format!("race-{}", round);
            let attachment = repo.insert(&name, "image/png", Utc::now()).await.unwrap();

            let claims = claim_concurrently(&repo, attachment.id).await;
            assert_eq!(claims.iter().filter(|won| **won).count(), 1);

            let winner = claims.iter().position(|won| *won).unwrap() as i64;
            let owner = repo.find(attachment.id).await.unwrap().unwrap().owning_post_id;
            assert_eq!(owner, Some(100 + winner));
        }
    }

    async fn claim_concurrently(repo: &SqliteAttachmentRepository, id: i64) -> Vec<bool> {
        let handles: Vec<_> = (0..4)
            .map(|post| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.associate(id, 100 + post).await.unwrap() })
            })
            .collect();

        let mut claims = Vec::with_capacity(handles.len());
        for handle in handles {
            claims.push(handle.await.unwrap());
        }
        claims
    }

    #[tokio::test]
    async fn test_list_orphans_excludes_recent_and_associated() {
        let repo = create_test_repository().await;
        let now = Utc::now();

        let old = repo
            .insert("old", "image/png", now - Duration::days(2))
            .await
            .unwrap();
        let owned = repo
            .insert("owned", "image/png", now - Duration::days(2))
            .await
            .unwrap();
        repo.associate(owned.id, 1).await.unwrap();
        repo.insert("fresh", "image/png", now).await.unwrap();

        let orphans = repo.list_orphans(now - Duration::days(1)).await.unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, old.id);
    }

    #[tokio::test]
    async fn test_delete_orphan_spares_associated() {
        let repo = create_test_repository().await;
        let attachment = repo.insert("abc", "image/png", Utc::now()).await.unwrap();
        repo.associate(attachment.id, 10).await.unwrap();

        assert!(!repo.delete_orphan(attachment.id).await.unwrap());
        assert!(repo.find(attachment.id).await.unwrap().is_some());
    }
}
