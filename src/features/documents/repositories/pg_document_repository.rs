use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::models::{Document, DocumentGrant, NewDocument};
use crate::features::documents::policy;
use crate::features::documents::repositories::blob_coordination::{
    persist_with_blob, read_document_blob, remove_document_blob,
};
use crate::features::documents::repositories::document_repository::{
    distinct_grantees, DocumentRepository,
};
use crate::modules::storage::BlobStore;

/// Postgres-backed document repository
pub struct PgDocumentRepository {
    pool: PgPool,
    blob_store: Arc<dyn BlobStore>,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool, blob_store: Arc<dyn BlobStore>) -> Self {
        Self { pool, blob_store }
    }

    /// Insert the document row and its grants in one transaction
    async fn insert_with_grants(
        &self,
        document: &NewDocument,
        storage_key: Option<String>,
        grantees: &[Uuid],
    ) -> Result<Document> {
        let mut tx = self.pool.begin().await?;

        match Self::insert_rows(&mut tx, document, storage_key, grantees).await {
            Ok(created) => {
                tx.commit().await.map_err(|e| {
                    tracing::error!("Failed to commit document create: {:?}", e);
                    AppError::Database(e)
                })?;
                Ok(created)
            }
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }

    async fn insert_rows(
        conn: &mut PgConnection,
        document: &NewDocument,
        storage_key: Option<String>,
        grantees: &[Uuid],
    ) -> Result<Document> {
        let created = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (owner_id, name, mime, has_file, public, storage_key, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id, owner_id, name, mime, has_file, public, storage_key, metadata,
                created_at, updated_at
            "#,
        )
        .bind(document.owner_id)
        .bind(&document.name)
        .bind(&document.mime)
        .bind(storage_key.is_some())
        .bind(document.public)
        .bind(&storage_key)
        .bind(document.metadata.clone().map(Json))
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert document: {:?}", e);
            AppError::Database(e)
        })?;

        for grantee in grantees {
            sqlx::query(
                r#"
                INSERT INTO document_grants (document_id, granted_to)
                VALUES ($1, $2)
                ON CONFLICT (document_id, granted_to) DO NOTHING
                "#,
            )
            .bind(created.id)
            .bind(grantee)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert document grant: {:?}", e);
                AppError::Database(e)
            })?;
        }

        Ok(created)
    }

    /// Grants, then the document row as the last mutation; the blob is left to the caller
    async fn delete_rows(
        conn: &mut PgConnection,
        document_id: Uuid,
        requesting_user_id: Uuid,
    ) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT
                id, owner_id, name, mime, has_file, public, storage_key, metadata,
                created_at, updated_at
            FROM documents
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(document_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        if !policy::can_delete(&document, requesting_user_id) {
            return Err(AppError::Forbidden(
                "Only the owner can delete this document".to_string(),
            ));
        }

        sqlx::query("DELETE FROM document_grants WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id)
            .execute(&mut *conn)
            .await?;

        Ok(document)
    }
}

async fn rollback(tx: Transaction<'_, Postgres>) {
    if let Err(e) = tx.rollback().await {
        warn!("Transaction rollback failed: {:?}", e);
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn create_document(
        &self,
        document: NewDocument,
        content: Option<Vec<u8>>,
        grantees: &[Uuid],
    ) -> Result<Document> {
        let grantees = distinct_grantees(grantees);

        let created = persist_with_blob(
            self.blob_store.as_ref(),
            content.as_deref(),
            &document.name,
            |storage_key| self.insert_with_grants(&document, storage_key, &grantees),
        )
        .await?;

        info!(
            "Document created: id={}, owner_id={}, has_file={}, grants={}",
            created.id,
            created.owner_id,
            created.has_file,
            grantees.len()
        );

        Ok(created)
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Document> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT
                id, owner_id, name, mime, has_file, public, storage_key, metadata,
                created_at, updated_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
    }

    async fn list_grants(&self, document_id: Uuid) -> Result<Vec<DocumentGrant>> {
        let grants = sqlx::query_as::<_, DocumentGrant>(
            r#"
            SELECT id, document_id, granted_to
            FROM document_grants
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }

    async fn get_file_content(&self, document: &Document) -> Result<Vec<u8>> {
        read_document_blob(self.blob_store.as_ref(), document).await
    }

    async fn list_documents_visible_to(&self, user_id: Uuid) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT
                d.id, d.owner_id, d.name, d.mime, d.has_file, d.public, d.storage_key,
                d.metadata, d.created_at, d.updated_at
            FROM documents d
            WHERE d.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM document_grants g
                   WHERE g.document_id = d.id AND g.granted_to = $1
               )
            ORDER BY d.name ASC, d.created_at ASC, d.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list documents: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(documents)
    }

    async fn delete_document(&self, document_id: Uuid, requesting_user_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        match Self::delete_rows(&mut tx, document_id, requesting_user_id).await {
            Ok(document) => {
                tx.commit().await.map_err(|e| {
                    tracing::error!(
                        "Failed to commit delete of document {}: {:?}",
                        document.id,
                        e
                    );
                    AppError::Database(e)
                })?;

                if let Some(key) = document.storage_key.as_deref() {
                    if let Err(e) = remove_document_blob(self.blob_store.as_ref(), key).await {
                        tracing::error!(
                            "Orphaned blob '{}' left by deleted document {}: {}",
                            key,
                            document.id,
                            e
                        );
                    }
                }

                info!(
                    "Document deleted: id={}, owner_id={}",
                    document.id, document.owner_id
                );
                Ok(())
            }
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }
}
