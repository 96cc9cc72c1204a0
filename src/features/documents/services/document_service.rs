use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::AccountDirectory;
use crate::features::documents::dtos::{
    normalize_field, CreateDocumentMetaDto, DocumentResponseDto, ListDocumentsQuery, UploadedFile,
};
use crate::features::documents::models::{DocumentContent, NewDocument};
use crate::features::documents::policy;
use crate::features::documents::repositories::DocumentRepository;
use crate::features::documents::services::document_filter::DocumentFilter;
use crate::shared::constants::{DEFAULT_MIME_TYPE, MAX_DOCUMENT_FIELD_LEN};

/// Service for document operations
pub struct DocumentService {
    repository: Arc<dyn DocumentRepository>,
    accounts: Arc<dyn AccountDirectory>,
}

impl DocumentService {
    pub fn new(repository: Arc<dyn DocumentRepository>, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self {
            repository,
            accounts,
        }
    }

    /// Create a document owned by `owner_id`
    ///
    /// Every grantee login is resolved before anything is stored, so an
    /// unknown login fails the upload without side effects.
    pub async fn create(
        &self,
        owner_id: Uuid,
        meta: CreateDocumentMetaDto,
        file: Option<UploadedFile>,
    ) -> Result<DocumentResponseDto> {
        meta.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let name = normalize_field(meta.name.as_deref())
            .or_else(|| file.as_ref().and_then(|f| normalize_field(f.file_name.as_deref())))
            .ok_or_else(|| AppError::Validation("name is required".to_string()))?;

        let mime = normalize_field(meta.mime.as_deref())
            .or_else(|| file.as_ref().and_then(|f| normalize_field(f.content_type.as_deref())))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        ensure_field_len("name", &name)?;
        ensure_field_len("mime", &mime)?;

        let mut grantees = Vec::with_capacity(meta.grant.len());
        for login in &meta.grant {
            let login = login.trim();
            if login.is_empty() {
                continue;
            }
            grantees.push(self.accounts.resolve_login(login).await?);
        }

        let new_document = NewDocument {
            owner_id,
            name,
            mime,
            public: meta.public,
            metadata: meta.json,
        };

        let document = self
            .repository
            .create_document(new_document, file.map(|f| f.bytes), &grantees)
            .await?;

        Ok(document.into())
    }

    /// Fetch a document and its payload for a reader
    pub async fn get_one(&self, user_id: Uuid, document_id: Uuid) -> Result<DocumentContent> {
        let document = self.repository.get_document(document_id).await?;
        let grants = self.repository.list_grants(document_id).await?;

        if !policy::can_read(&document, user_id, &grants) {
            debug!(
                "Read denied: document_id={}, user_id={}",
                document_id, user_id
            );
            return Err(AppError::Forbidden("no access".to_string()));
        }

        let content = if document.has_file {
            Some(self.repository.get_file_content(&document).await?)
        } else {
            None
        };

        Ok(DocumentContent { document, content })
    }

    /// List documents visible to `user_id`, filtered and truncated.
    ///
    /// Returns the page together with the number of matches before truncation.
    pub async fn get_all(
        &self,
        user_id: Uuid,
        query: &ListDocumentsQuery,
    ) -> Result<(Vec<DocumentResponseDto>, usize)> {
        let filter = DocumentFilter::from_query(query)?;

        let owner_id = match filter.login.as_deref() {
            Some(login) => Some(self.accounts.resolve_login(login).await?),
            None => None,
        };

        let matching: Vec<_> = self
            .repository
            .list_documents_visible_to(user_id)
            .await?
            .into_iter()
            .filter(|document| owner_id.is_none_or(|owner| document.owner_id == owner))
            .filter(|document| filter.matches(document))
            .collect();

        let total = matching.len();
        let documents = matching
            .into_iter()
            .take(filter.limit)
            .map(DocumentResponseDto::from)
            .collect();

        Ok((documents, total))
    }

    /// Delete a document; owner only
    pub async fn delete(&self, user_id: Uuid, document_id: Uuid) -> Result<()> {
        self.repository
            .delete_document(document_id, user_id)
            .await?;

        info!(
            "Document removed by owner: document_id={}, user_id={}",
            document_id, user_id
        );
        Ok(())
    }
}

fn ensure_field_len(field: &str, value: &str) -> Result<()> {
    if value.chars().count() > MAX_DOCUMENT_FIELD_LEN {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_DOCUMENT_FIELD_LEN
        )));
    }
    Ok(())
}
