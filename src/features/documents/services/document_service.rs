use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::documents::models::Document;
use crate::modules::storage::DiskStorage;

/// Service for document operations
///
/// Composes the record store (SQLite) and the blob store (disk). The two are
/// not covered by one transaction; instead each mutation orders its steps so
/// an interrupted sequence can only leave an orphaned blob, never a row
/// pointing at nothing.
pub struct DocumentService {
    pool: SqlitePool,
    storage: Arc<DiskStorage>,
}

impl DocumentService {
    pub fn new(pool: SqlitePool, storage: Arc<DiskStorage>) -> Self {
        Self { pool, storage }
    }

    /// Blob store handle, used by the download handler to open blobs
    pub fn storage(&self) -> &DiskStorage {
        &self.storage
    }

    /// Store an uploaded blob and insert its metadata row.
    ///
    /// The blob is written first; if the row insert fails the blob is removed
    /// again so no unreferenced file is left behind.
    pub async fn upload(&self, data: Vec<u8>, original_filename: &str) -> Result<Document> {
        let filesize = data.len() as i64;

        let blob_name = DiskStorage::generate_blob_name(original_filename);
        let filepath = self.storage.write(&blob_name, &data).await?;

        let inserted = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (filename, filepath, filesize, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, filename, filepath, filesize, created_at
            "#,
        )
        .bind(original_filename)
        .bind(&filepath)
        .bind(filesize)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        let doc = match inserted {
            Ok(doc) => doc,
            Err(e) => {
                // Compensate: drop the blob we just wrote
                if let Err(cleanup) = self.storage.remove(&filepath).await {
                    warn!(
                        "Failed to clean up blob {} after insert error: {}",
                        filepath, cleanup
                    );
                }
                tracing::error!("Failed to insert document row: {:?}", e);
                return Err(AppError::Database(e));
            }
        };

        info!(
            "Document stored: id={}, filename={}, size={}",
            doc.id, doc.filename, doc.filesize
        );

        Ok(doc)
    }

    /// List all documents, newest first.
    pub async fn list(&self) -> Result<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, filename, filepath, filesize, created_at
            FROM documents
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list documents: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(docs)
    }

    /// Look up one document by id.
    pub async fn get(&self, id: i64) -> Result<Document> {
        let doc = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, filename, filepath, filesize, created_at
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get document {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        doc.ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// Delete a document row and its blob.
    ///
    /// The row goes first so a second delete of the same id sees a clean 404;
    /// the blob removal tolerates a file that is already gone. A blob removal
    /// failure after the row is gone is logged, not surfaced - the row is the
    /// source of truth.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let doc = self.get(id).await?;

        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete document {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        match self.storage.remove(&doc.filepath).await {
            Ok(removed) => {
                if !removed {
                    warn!("Blob already absent for document {}: {}", id, doc.filepath);
                }
            }
            Err(e) => {
                warn!(
                    "Failed to remove blob {} for document {}: {}",
                    doc.filepath, id, e
                );
            }
        }

        info!("Document deleted: id={}, filename={}", id, doc.filename);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn setup() -> (DocumentService, TempDir) {
        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(DiskStorage::new(dir.path()).await.unwrap());

        (DocumentService::new(pool, storage), dir)
    }

    #[tokio::test]
    async fn upload_creates_row_and_blob() {
        let (service, _dir) = setup().await;

        let doc = service
            .upload(vec![0u8; 2048], "report.pdf")
            .await
            .unwrap();

        assert_eq!(doc.filename, "report.pdf");
        assert_eq!(doc.filesize, 2048);
        assert!(std::path::Path::new(&doc.filepath).is_file());
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let (service, _dir) = setup().await;

        let first = service.upload(b"one".to_vec(), "a.pdf").await.unwrap();
        let second = service.upload(b"two".to_vec(), "b.pdf").await.unwrap();
        let third = service.upload(b"three".to_vec(), "c.pdf").await.unwrap();

        let docs = service.list().await.unwrap();
        let ids: Vec<i64> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let (service, _dir) = setup().await;

        let err = service.get(999_999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_row_and_blob() {
        let (service, _dir) = setup().await;

        let doc = service.upload(b"data".to_vec(), "x.pdf").await.unwrap();
        service.delete(doc.id).await.unwrap();

        assert!(service.list().await.unwrap().is_empty());
        assert!(!std::path::Path::new(&doc.filepath).exists());
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let (service, _dir) = setup().await;

        let doc = service.upload(b"data".to_vec(), "x.pdf").await.unwrap();
        service.delete(doc.id).await.unwrap();

        let err = service.delete(doc.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_tolerates_missing_blob() {
        let (service, _dir) = setup().await;

        let doc = service.upload(b"data".to_vec(), "x.pdf").await.unwrap();
        tokio::fs::remove_file(&doc.filepath).await.unwrap();

        service.delete(doc.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }
}
