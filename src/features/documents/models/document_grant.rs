use sqlx::FromRow;
use uuid::Uuid;

/// Database model for per-user read grants
#[derive(Debug, Clone, FromRow)]
pub struct DocumentGrant {
    pub id: Uuid,
    pub document_id: Uuid,
    pub granted_to: Uuid,
}
