//! Document access decisions
//!
//! Pure functions: absence of access is `false`, never an error. Callers map a
//! denied read to a generic "no access" response.

use uuid::Uuid;

use crate::features::documents::models::{Document, DocumentGrant};

/// Public documents, the owner, and explicit grantees may read
pub fn can_read(document: &Document, user_id: Uuid, grants: &[DocumentGrant]) -> bool {
    document.public
        || document.owner_id == user_id
        || grants
            .iter()
            .any(|grant| grant.document_id == document.id && grant.granted_to == user_id)
}

/// Only the owner may delete; grants and the public flag never confer it
pub fn can_delete(document: &Document, user_id: Uuid) -> bool {
    document.owner_id == user_id
}
