mod document_dto;

pub use document_dto::{
    normalize_field, CreateDocumentMetaDto, DeleteDocumentResponseDto, DocumentResponseDto,
    ListDocumentsQuery, UploadDocumentDto, UploadedFile,
};
