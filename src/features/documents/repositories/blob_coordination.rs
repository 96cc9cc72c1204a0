//! Keeps document rows and blob store payloads consistent
//!
//! The database and the filesystem are separate sources of truth with no
//! shared transaction. These helpers order the blob side of each operation and
//! compensate when the database side fails.

use std::future::Future;
use tracing::{debug, error, warn};

use crate::core::error::{AppError, Result};
use crate::features::documents::models::Document;
use crate::modules::storage::BlobStore;

/// Write the payload (if any) first, then run `persist` with its key.
///
/// When `persist` fails the freshly written blob is deleted again, so a failed
/// create never leaves an orphaned file. A failed blob write returns before
/// `persist` runs.
pub async fn persist_with_blob<T, F, Fut>(
    blob_store: &dyn BlobStore,
    content: Option<&[u8]>,
    suggested_name: &str,
    persist: F,
) -> Result<T>
where
    F: FnOnce(Option<String>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let storage_key = match content {
        Some(bytes) => Some(blob_store.put(bytes, suggested_name).await?),
        None => None,
    };

    match persist(storage_key.clone()).await {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Some(key) = storage_key {
                discard_orphan(blob_store, &key).await;
            }
            Err(err)
        }
    }
}

/// Best-effort cleanup; never masks the error that triggered it
async fn discard_orphan(blob_store: &dyn BlobStore, key: &str) {
    match blob_store.delete(key).await {
        Ok(()) => warn!("Removed blob of failed document create: key={}", key),
        Err(e) if e.is_not_found() => debug!("Blob of failed create already gone: key={}", key),
        Err(e) => error!("Failed to remove orphaned blob key={}: {}", key, e),
    }
}

/// Read a document's payload.
///
/// A document without a file is `NotFound`; a document whose blob is missing
/// is an `Integrity` error, never an empty payload.
pub async fn read_document_blob(blob_store: &dyn BlobStore, document: &Document) -> Result<Vec<u8>> {
    let key = match (document.has_file, document.storage_key.as_deref()) {
        (true, Some(key)) => key,
        (true, None) => {
            return Err(AppError::Integrity(format!(
                "Document {} has a file but no storage key",
                document.id
            )))
        }
        (false, _) => {
            return Err(AppError::NotFound(format!(
                "Document {} has no file",
                document.id
            )))
        }
    };

    blob_store.get(key).await.map_err(|e| {
        if e.is_not_found() {
            AppError::Integrity(format!(
                "Blob '{}' of document {} is missing",
                key, document.id
            ))
        } else {
            e
        }
    })
}

/// Remove a deleted document's payload; an already-missing blob is tolerated
pub async fn remove_document_blob(blob_store: &dyn BlobStore, key: &str) -> Result<()> {
    match blob_store.delete(key).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            warn!("Blob already missing while deleting document: key={}", key);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
