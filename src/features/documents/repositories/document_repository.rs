use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::documents::models::{Document, DocumentGrant, NewDocument};

/// Persistence for documents, their grants and their payloads.
///
/// Implementations own the cross-store invariant: a document row with
/// `has_file = true` exists exactly when its blob exists.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Store the payload, the document row and one grant per distinct grantee,
    /// all or nothing
    async fn create_document(
        &self,
        document: NewDocument,
        content: Option<Vec<u8>>,
        grantees: &[Uuid],
    ) -> Result<Document>;

    async fn get_document(&self, document_id: Uuid) -> Result<Document>;

    async fn list_grants(&self, document_id: Uuid) -> Result<Vec<DocumentGrant>>;

    /// Payload of a document; `Integrity` if the row claims a blob that is gone
    async fn get_file_content(&self, document: &Document) -> Result<Vec<u8>>;

    /// Owned or granted documents, each once, ordered by name then creation time
    async fn list_documents_visible_to(&self, user_id: Uuid) -> Result<Vec<Document>>;

    /// Owner-only delete of the document, its grants and its payload
    async fn delete_document(&self, document_id: Uuid, requesting_user_id: Uuid) -> Result<()>;
}

/// Grantee ids with duplicates removed, first occurrence wins
pub fn distinct_grantees(grantees: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(grantees.len());
    grantees
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_grantees_preserves_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(distinct_grantees(&[a, b, a, b, a]), vec![a, b]);
        assert!(distinct_grantees(&[]).is_empty());
    }
}
