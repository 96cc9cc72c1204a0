use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    LoginRequestDto, LoginResponseDto, RegisterRequestDto, RegisterResponseDto,
};
use crate::features::auth::models::{session_expiry, Session, User};
use crate::features::auth::services::password::{
    generate_session_token, secrets_match, PasswordHasher,
};

/// Identity lookups consumed by the document feature and the auth middleware
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Resolve a session token to its user id; missing or expired sessions are `Unauthorized`
    async fn resolve_token(&self, token: &str) -> Result<Uuid>;

    /// Resolve a login to its user id; unknown logins are `NotFound`
    async fn resolve_login(&self, login: &str) -> Result<Uuid>;
}

/// Service for account operations (register, sign-in, sign-out)
pub struct AuthService {
    pool: PgPool,
    hasher: PasswordHasher,
    admin_token: String,
    session_ttl: Option<Duration>,
}

impl AuthService {
    pub fn new(pool: PgPool, config: AuthConfig) -> Self {
        Self {
            pool,
            hasher: PasswordHasher::new(&config.password_pepper),
            admin_token: config.admin_token,
            session_ttl: config.session_ttl,
        }
    }

    /// Register a new user; requires the operator's admin token
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<RegisterResponseDto> {
        if !secrets_match(&dto.token, &self.admin_token) {
            return Err(AppError::Unauthorized("Not authorized".to_string()));
        }

        let password_hash = self.hasher.hash(&dto.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password_hash)
            VALUES ($1, $2)
            RETURNING id, login, password_hash, created_at
            "#,
        )
        .bind(&dto.login)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Login '{}' is already taken", dto.login))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::Database(e)
            }
        })?;

        info!("User registered: id={}, login={}", user.id, user.login);

        Ok(RegisterResponseDto {
            id: user.id,
            login: user.login,
            created_at: user.created_at,
        })
    }

    /// Verify credentials and open a new session
    pub async fn login(&self, dto: LoginRequestDto) -> Result<LoginResponseDto> {
        let user = self.find_user_by_login(&dto.login).await?;

        let user = match user {
            Some(user) if self.hasher.verify(&dto.password, &user.password_hash) => user,
            _ => {
                debug!("Rejected sign-in for login={}", dto.login);
                return Err(AppError::Unauthorized(
                    "Invalid login or password".to_string(),
                ));
            }
        };

        let token = generate_session_token();
        let expired_at = session_expiry(Utc::now(), self.session_ttl)?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token, expired_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token, created_at, expired_at
            "#,
        )
        .bind(user.id)
        .bind(&token)
        .bind(expired_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create session: {:?}", e);
            AppError::Database(e)
        })?;

        info!(
            "Session opened: id={}, user_id={}, expired_at={:?}",
            session.id, session.user_id, session.expired_at
        );

        Ok(LoginResponseDto {
            token: session.token,
            expired_at: session.expired_at,
        })
    }

    /// End a session
    pub async fn logout(&self, token: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Session not found".to_string()));
        }

        info!("Session closed");
        Ok(())
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, password_hash, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl AccountDirectory for AuthService {
    async fn resolve_token(&self, token: &str) -> Result<Uuid> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token, created_at, expired_at
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session not found".to_string()))?;

        if !session.is_active_at(Utc::now()) {
            return Err(AppError::Unauthorized("Session expired".to_string()));
        }

        Ok(session.user_id)
    }

    async fn resolve_login(&self, login: &str) -> Result<Uuid> {
        self.find_user_by_login(login)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", login)))
    }
}

#[cfg(test)]
mod tests {
    //! Postgres-backed tests; run with `cargo test -- --ignored` and `DATABASE_URL` set.

    use super::*;

    const ADMIN_TOKEN: &str = "admin-token";

    fn service(pool: PgPool, ttl_secs: u64) -> AuthService {
        let config = AuthConfig::new(
            ADMIN_TOKEN.to_string(),
            "test-pepper-0123456789".to_string(),
            ttl_secs,
        )
        .unwrap();
        AuthService::new(pool, config)
    }

    fn register_dto(token: &str, login: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            token: token.to_string(),
            login: login.to_string(),
            password: "Passw0rd!".to_string(),
        }
    }

    fn login_dto(login: &str, password: &str) -> LoginRequestDto {
        LoginRequestDto {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn register_requires_admin_token_and_unique_login(pool: PgPool) {
        let service = service(pool, 3600);

        let denied = service.register(register_dto("wrong", "johndoe1")).await;
        assert!(matches!(denied, Err(AppError::Unauthorized(_))));

        let user = service
            .register(register_dto(ADMIN_TOKEN, "johndoe1"))
            .await
            .unwrap();
        assert_eq!(user.login, "johndoe1");

        let duplicate = service.register(register_dto(ADMIN_TOKEN, "johndoe1")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn login_resolve_and_logout(pool: PgPool) {
        let service = service(pool, 3600);
        let user = service
            .register(register_dto(ADMIN_TOKEN, "johndoe1"))
            .await
            .unwrap();

        let bad = service.login(login_dto("johndoe1", "Wrong0rd!")).await;
        assert!(matches!(bad, Err(AppError::Unauthorized(_))));
        let unknown = service.login(login_dto("nobody123", "Passw0rd!")).await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));

        let session = service
            .login(login_dto("johndoe1", "Passw0rd!"))
            .await
            .unwrap();
        assert!(session.expired_at.is_some());
        assert_eq!(service.resolve_token(&session.token).await.unwrap(), user.id);
        assert_eq!(service.resolve_login("johndoe1").await.unwrap(), user.id);
        assert!(service
            .resolve_login("nobody123")
            .await
            .unwrap_err()
            .is_not_found());

        service.logout(&session.token).await.unwrap();
        assert!(matches!(
            service.resolve_token(&session.token).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(service.logout(&session.token).await.unwrap_err().is_not_found());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn expired_and_non_expiring_sessions(pool: PgPool) {
        let service = service(pool.clone(), 0);
        let user = service
            .register(register_dto(ADMIN_TOKEN, "johndoe1"))
            .await
            .unwrap();

        let session = service
            .login(login_dto("johndoe1", "Passw0rd!"))
            .await
            .unwrap();
        assert!(session.expired_at.is_none());
        assert_eq!(service.resolve_token(&session.token).await.unwrap(), user.id);

        sqlx::query("UPDATE sessions SET expired_at = NOW() - INTERVAL '1 second' WHERE token = $1")
            .bind(&session.token)
            .execute(&pool)
            .await
            .unwrap();

        let err = service.resolve_token(&session.token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg.contains("expired")));
    }
}
