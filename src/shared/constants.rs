/// Default number of documents returned by a listing
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Maximum number of documents a single listing may return
pub const MAX_LIST_LIMIT: usize = 100;

/// Maximum length of document names and MIME types
pub const MAX_DOCUMENT_FIELD_LEN: usize = 255;

/// Fallback MIME type for uploads without a declared content type
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
