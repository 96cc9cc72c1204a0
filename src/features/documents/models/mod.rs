mod document;
mod document_grant;

pub use document::{Document, DocumentContent, Metadata, NewDocument};
pub use document_grant::DocumentGrant;
