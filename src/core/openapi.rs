use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::documents::{dtos as documents_dtos, handlers as documents_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        // Documents
        documents_handlers::create_document,
        documents_handlers::list_documents,
        documents_handlers::get_document,
        documents_handlers::delete_document,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::dtos::RegisterRequestDto,
            auth::dtos::RegisterResponseDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::LoginResponseDto,
            auth::dtos::LogoutResponseDto,
            ApiResponse<auth::dtos::RegisterResponseDto>,
            ApiResponse<auth::dtos::LoginResponseDto>,
            ApiResponse<auth::dtos::LogoutResponseDto>,
            // Documents
            documents_dtos::CreateDocumentMetaDto,
            documents_dtos::UploadDocumentDto,
            documents_dtos::DocumentResponseDto,
            documents_dtos::DeleteDocumentResponseDto,
            ApiResponse<documents_dtos::DocumentResponseDto>,
            ApiResponse<Vec<documents_dtos::DocumentResponseDto>>,
            ApiResponse<documents_dtos::DeleteDocumentResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Registration and session management"),
        (name = "documents", description = "Document upload, download, listing and deletion"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Docvault API",
        version = "0.1.0",
        description = "API documentation for Docvault",
    )
)]
pub struct ApiDoc;

/// Adds the session token security scheme to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("Session token")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_document_and_auth_paths() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/{token}",
            "/api/docs",
            "/api/docs/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_swagger_info_modifier_overrides_info() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Vault".to_string(),
            version: "2.0.0".to_string(),
            description: "Internal".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Vault");
        assert_eq!(doc.info.version, "2.0.0");
        assert_eq!(doc.info.description.as_deref(), Some("Internal"));
    }
}
