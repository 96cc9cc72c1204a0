use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::dtos::{
    LoginRequestDto, LoginResponseDto, LogoutResponseDto, RegisterRequestDto,
    RegisterResponseDto,
};
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;

/// Register a new user
///
/// Requires the operator's admin token in the request body.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<RegisterResponseDto>),
        (status = 400, description = "Invalid login or password"),
        (status = 401, description = "Invalid admin token"),
        (status = 409, description = "Login already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResponseDto>>)> {
    let user = service.register(dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(user), None, None)),
    ))
}

/// Sign in and receive a session token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Session opened", body = ApiResponse<LoginResponseDto>),
        (status = 401, description = "Invalid login or password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    ValidatedJson(dto): ValidatedJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<LoginResponseDto>>> {
    let session = service.login(dto).await?;

    Ok(Json(ApiResponse::success(Some(session), None, None)))
}

/// Sign out, ending the session identified by the token
#[utoipa::path(
    delete,
    path = "/api/auth/{token}",
    params(
        ("token" = String, Path, description = "Session token")
    ),
    responses(
        (status = 200, description = "Session closed", body = ApiResponse<LogoutResponseDto>),
        (status = 404, description = "Session not found")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(service): State<Arc<AuthService>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<LogoutResponseDto>>> {
    service.logout(&token).await?;

    Ok(Json(ApiResponse::success(
        Some(LogoutResponseDto {
            token,
            closed: true,
        }),
        Some("Session closed".to_string()),
        None,
    )))
}
