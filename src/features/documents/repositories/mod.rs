pub(crate) mod blob_coordination;
pub(crate) mod document_repository;
mod pg_document_repository;

pub use document_repository::DocumentRepository;
pub use pg_document_repository::PgDocumentRepository;
