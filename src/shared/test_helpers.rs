//! In-memory doubles for the document and account seams

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::AccountDirectory;
use crate::features::documents::models::{Document, DocumentGrant, NewDocument};
use crate::features::documents::policy;
use crate::features::documents::repositories::blob_coordination::{
    persist_with_blob, read_document_blob, remove_document_blob,
};
use crate::features::documents::repositories::document_repository::distinct_grantees;
use crate::features::documents::repositories::DocumentRepository;
use crate::modules::storage::LocalBlobStore;

/// Users keyed by login, each with one session token `token-<login>`
#[derive(Default)]
pub struct InMemoryAccounts {
    logins: HashMap<String, Uuid>,
    tokens: HashMap<String, Uuid>,
}

impl InMemoryAccounts {
    pub fn add_user(&mut self, login: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.logins.insert(login.to_string(), id);
        self.tokens.insert(Self::token_for(login), id);
        id
    }

    pub fn token_for(login: &str) -> String {
        format!("token-{}", login)
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccounts {
    async fn resolve_token(&self, token: &str) -> Result<Uuid> {
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Session not found".to_string()))
    }

    async fn resolve_login(&self, login: &str) -> Result<Uuid> {
        self.logins
            .get(login)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", login)))
    }
}

#[derive(Default)]
struct RepositoryState {
    documents: Vec<Document>,
    grants: Vec<DocumentGrant>,
}

/// Document repository over plain collections with the same contract as the Postgres one.
///
/// Payloads go through a real `LocalBlobStore` in a temporary directory and the
/// same blob coordination helpers the Postgres repository uses.
pub struct InMemoryDocumentRepository {
    state: Mutex<RepositoryState>,
    blob_store: LocalBlobStore,
    reject_inserts: AtomicBool,
}

impl Default for InMemoryDocumentRepository {
    fn default() -> Self {
        let uploads_dir = std::env::temp_dir().join(format!("docvault-mem-{}", Uuid::new_v4()));
        Self {
            state: Mutex::new(RepositoryState::default()),
            blob_store: LocalBlobStore::new(&StorageConfig { uploads_dir }),
            reject_inserts: AtomicBool::new(false),
        }
    }
}

impl InMemoryDocumentRepository {
    pub fn document_count(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    /// Payload files currently in the blob store directory
    pub fn blob_count(&self) -> usize {
        std::fs::read_dir(self.blob_store.root())
            .map(|entries| entries.filter_map(|e| e.ok()).count())
            .unwrap_or(0)
    }

    /// Make every following row insert fail, after the payload has been written
    pub fn reject_inserts(&self) {
        self.reject_inserts.store(true, Ordering::SeqCst);
    }

    /// Drop a stored payload behind the repository's back
    pub fn remove_blob(&self, document_id: Uuid) {
        let key = self
            .state
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|d| d.id == document_id)
            .and_then(|d| d.storage_key.clone());
        if let Some(key) = key {
            std::fs::remove_file(self.blob_store.root().join(key)).unwrap();
        }
    }

    fn insert_rows(
        &self,
        document: NewDocument,
        storage_key: Option<String>,
        grantees: &[Uuid],
    ) -> Result<Document> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("Insert rejected".to_string()));
        }

        let now = Utc::now();
        let created = Document {
            id: Uuid::new_v4(),
            owner_id: document.owner_id,
            name: document.name,
            mime: document.mime,
            has_file: storage_key.is_some(),
            public: document.public,
            storage_key,
            metadata: document.metadata.map(Json),
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock().unwrap();
        for grantee in distinct_grantees(grantees) {
            state.grants.push(DocumentGrant {
                id: Uuid::new_v4(),
                document_id: created.id,
                granted_to: grantee,
            });
        }
        state.documents.push(created.clone());

        Ok(created)
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create_document(
        &self,
        document: NewDocument,
        content: Option<Vec<u8>>,
        grantees: &[Uuid],
    ) -> Result<Document> {
        let suggested_name = document.name.clone();

        persist_with_blob(
            &self.blob_store,
            content.as_deref(),
            &suggested_name,
            |storage_key| async move { self.insert_rows(document, storage_key, grantees) },
        )
        .await
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Document> {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|d| d.id == document_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
    }

    async fn list_grants(&self, document_id: Uuid) -> Result<Vec<DocumentGrant>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .grants
            .iter()
            .filter(|g| g.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn get_file_content(&self, document: &Document) -> Result<Vec<u8>> {
        read_document_blob(&self.blob_store, document).await
    }

    async fn list_documents_visible_to(&self, user_id: Uuid) -> Result<Vec<Document>> {
        let state = self.state.lock().unwrap();
        let mut visible: Vec<Document> = state
            .documents
            .iter()
            .filter(|d| {
                d.owner_id == user_id
                    || state
                        .grants
                        .iter()
                        .any(|g| g.document_id == d.id && g.granted_to == user_id)
            })
            .cloned()
            .collect();

        visible.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(visible)
    }

    async fn delete_document(&self, document_id: Uuid, requesting_user_id: Uuid) -> Result<()> {
        let document = {
            let mut state = self.state.lock().unwrap();
            let document = state
                .documents
                .iter()
                .find(|d| d.id == document_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

            if !policy::can_delete(&document, requesting_user_id) {
                return Err(AppError::Forbidden(
                    "Only the owner can delete this document".to_string(),
                ));
            }

            state.grants.retain(|g| g.document_id != document_id);
            state.documents.retain(|d| d.id != document_id);
            document
        };

        if let Some(key) = document.storage_key.as_deref() {
            if let Err(e) = remove_document_blob(&self.blob_store, key).await {
                tracing::error!("Orphaned blob '{}' left by deleted document: {}", key, e);
            }
        }
        Ok(())
    }
}
