use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Opaque key-value payload attached to a document
pub type Metadata = Map<String, Value>;

/// Database model for documents
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub mime: String,
    pub has_file: bool,
    pub public: bool,
    /// Blob store key; set exactly when `has_file` is true
    pub storage_key: Option<String>,
    pub metadata: Option<Json<Metadata>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref().map(|json| &json.0)
    }
}

/// Fields supplied when creating a document
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner_id: Uuid,
    pub name: String,
    pub mime: String,
    pub public: bool,
    pub metadata: Option<Metadata>,
}

/// A readable document together with its payload, if it has one
#[derive(Debug)]
pub struct DocumentContent {
    pub document: Document,
    pub content: Option<Vec<u8>>,
}
