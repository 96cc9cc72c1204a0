use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::shared::validation::{validate_password_strength, LOGIN_REGEX};

/// Request DTO for user registration (operator only)
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    /// Administrator token authorizing the registration
    #[validate(length(min = 1, message = "Admin token is required"))]
    pub token: String,

    #[validate(regex(
        path = *LOGIN_REGEX,
        message = "Login must be at least 8 latin letters or digits"
    ))]
    pub login: String,

    #[serde(alias = "pswd")]
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
}

/// Response DTO for a registered user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponseDto {
    pub id: Uuid,
    pub login: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for sign-in
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,

    #[serde(alias = "pswd")]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response DTO for sign-in
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponseDto {
    /// Opaque session token
    pub token: String,
    /// Session expiry, absent for non-expiring sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,
}

/// Response DTO for sign-out
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponseDto {
    pub token: String,
    pub closed: bool,
}
