use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::documents::dtos::{
    CreateDocumentMetaDto, DeleteDocumentResponseDto, DocumentResponseDto, ListDocumentsQuery,
    UploadDocumentDto, UploadedFile,
};
use crate::features::documents::models::Document;
use crate::features::documents::services::DocumentService;
use crate::shared::types::{ApiResponse, Meta};

/// Upload a document
///
/// Accepts multipart/form-data with:
/// - `meta`: JSON object with `name`, `mime`, `public`, `grant` and `json` (required)
/// - `file`: The document payload (optional, at most one)
#[utoipa::path(
    post,
    path = "/api/docs",
    tag = "documents",
    request_body(
        content = UploadDocumentDto,
        content_type = "multipart/form-data",
        description = "Document metadata as JSON and an optional file",
    ),
    responses(
        (status = 201, description = "Document created", body = ApiResponse<DocumentResponseDto>),
        (status = 400, description = "Invalid metadata"),
        (status = 401, description = "Session required"),
        (status = 404, description = "Grantee login not found"),
        (status = 413, description = "Upload too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponseDto>>)> {
    let mut meta: Option<CreateDocumentMetaDto> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "meta" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read meta field: {}", e))
                })?;
                meta = Some(serde_json::from_str(&text).map_err(|e| {
                    AppError::BadRequest(format!("Invalid meta JSON: {}", e))
                })?);
            }
            "file" => {
                if file.is_some() {
                    return Err(AppError::BadRequest(
                        "Only one file part is allowed".to_string(),
                    ));
                }

                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let meta = meta.ok_or_else(|| AppError::BadRequest("meta field is required".to_string()))?;

    let document = service.create(user.user_id, meta, file).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(document), None, None)),
    ))
}

/// List documents visible to the caller
///
/// Owned and granted documents ordered by name, then creation time.
#[utoipa::path(
    get,
    path = "/api/docs",
    tag = "documents",
    params(ListDocumentsQuery),
    responses(
        (status = 200, description = "Visible documents", body = ApiResponse<Vec<DocumentResponseDto>>),
        (status = 400, description = "Invalid filter or limit"),
        (status = 401, description = "Session required"),
        (status = 404, description = "Owner login not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_documents(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<ApiResponse<Vec<DocumentResponseDto>>>> {
    let (documents, total) = service.get_all(user.user_id, &query).await?;

    Ok(Json(ApiResponse::success(
        Some(documents),
        None,
        Some(Meta {
            total: total as i64,
        }),
    )))
}

/// Get a document
///
/// Documents with a file respond with the raw payload as an attachment;
/// documents without one respond with their metadata.
#[utoipa::path(
    get,
    path = "/api/docs/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document payload, or metadata when it has no file", body = ApiResponse<DocumentResponseDto>),
        (status = 401, description = "Session required"),
        (status = 403, description = "No access"),
        (status = 404, description = "Document not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let found = service.get_one(user.user_id, id).await?;

    match found.content {
        Some(content) => attachment_response(&found.document, content),
        None => {
            let dto = DocumentResponseDto::from(found.document);
            Ok(Json(ApiResponse::success(Some(dto), None, None)).into_response())
        }
    }
}

/// Delete a document
///
/// Only the owner of the document can delete it.
#[utoipa::path(
    delete,
    path = "/api/docs/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document deleted", body = ApiResponse<DeleteDocumentResponseDto>),
        (status = 401, description = "Session required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Document not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteDocumentResponseDto>>> {
    service.delete(user.user_id, id).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteDocumentResponseDto { deleted: true }),
        Some("Document deleted successfully".to_string()),
        None,
    )))
}

fn attachment_response(document: &Document, content: Vec<u8>) -> Result<Response> {
    let content_type = HeaderValue::from_str(&document.mime)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&document.name))
        .map_err(|e| AppError::Internal(format!("Invalid Content-Disposition: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(content),
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback and the UTF-8 name in `filename*`
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}
