use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::documents::models::{Document, Metadata};

/// The `meta` part of a document upload
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateDocumentMetaDto {
    /// Document name; defaults to the uploaded file's name
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    #[schema(example = "report.pdf")]
    pub name: Option<String>,
    /// MIME type; defaults to the uploaded file's content type
    #[validate(length(min = 1, max = 255, message = "mime must be 1-255 characters"))]
    #[schema(example = "application/pdf")]
    pub mime: Option<String>,
    /// Readable by every authenticated user when true
    #[serde(default)]
    pub public: bool,
    /// Logins of the users granted read access
    #[serde(default)]
    pub grant: Vec<String>,
    /// Arbitrary JSON object stored with the document
    #[schema(value_type = Option<Object>)]
    pub json: Option<Metadata>,
}

/// Multipart form for document uploads, used for Swagger UI documentation only
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentDto {
    /// JSON-encoded `CreateDocumentMetaDto`
    #[schema(example = r#"{"name":"report.pdf","public":false,"grant":["colleague1"]}"#)]
    pub meta: String,
    /// Optional document payload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: Option<String>,
}

/// A file received alongside the upload metadata
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Query params for listing documents
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListDocumentsQuery {
    /// Only documents owned by this login
    pub login: Option<String>,
    /// Field to match: name, mime, public, file or json.<key>
    pub key: Option<String>,
    /// Exact value the field must have
    pub value: Option<String>,
    /// Maximum number of documents (1-100, default 10)
    #[param(value_type = Option<u32>, minimum = 1, maximum = 100)]
    pub limit: Option<String>,
}

/// Response DTO for documents
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponseDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub mime: String,
    /// Whether the document carries a payload
    pub file: bool,
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub json: Option<Metadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponseDto {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            owner_id: document.owner_id,
            name: document.name,
            mime: document.mime,
            file: document.has_file,
            public: document.public,
            json: document.metadata.map(|json| json.0),
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteDocumentResponseDto {
    pub deleted: bool,
}

/// Trimmed text, `None` when blank
pub fn normalize_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meta_defaults() {
        let meta: CreateDocumentMetaDto = serde_json::from_value(json!({})).unwrap();

        assert!(meta.name.is_none());
        assert!(!meta.public);
        assert!(meta.grant.is_empty());
        assert!(meta.json.is_none());
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_meta_accepts_generated_file_names() {
        use fake::faker::filesystem::en::FileName;
        use fake::Fake;

        for _ in 0..20 {
            let name: String = FileName().fake();
            let meta = CreateDocumentMetaDto {
                name: Some(name.clone()),
                ..Default::default()
            };
            assert!(meta.validate().is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_meta_rejects_overlong_name() {
        let meta = CreateDocumentMetaDto {
            name: Some("a".repeat(256)),
            ..Default::default()
        };
        assert!(meta.validate().is_err());
    }

    #[test]
    fn test_meta_json_must_be_an_object() {
        let result: Result<CreateDocumentMetaDto, _> =
            serde_json::from_value(json!({"name": "a", "json": [1, 2]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_omits_missing_metadata() {
        let dto = DocumentResponseDto {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "notes".to_string(),
            mime: "text/plain".to_string(),
            file: false,
            public: true,
            json: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&dto).unwrap();
        assert!(value.get("json").is_none());
        assert_eq!(value["file"], json!(false));
    }

    #[test]
    fn test_normalize_field() {
        assert_eq!(normalize_field(Some("  a.pdf ")), Some("a.pdf".to_string()));
        assert_eq!(normalize_field(Some("   ")), None);
        assert_eq!(normalize_field(None), None);
    }
}
