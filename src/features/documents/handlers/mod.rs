pub mod document_handler;

pub use document_handler::{
    __path_create_document, __path_delete_document, __path_get_document, __path_list_documents,
    create_document, delete_document, get_document, list_documents,
};
