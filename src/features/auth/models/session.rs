use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::time::Duration;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// Database model for sign-in sessions
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the session never expires
    pub expired_at: Option<DateTime<Utc>>,
}

impl Session {
    /// `expired_at IS NULL OR expired_at > now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.expired_at {
            None => true,
            Some(expired_at) => expired_at > now,
        }
    }
}

/// Expiry timestamp for a session issued at `now`
///
/// `None` only when no TTL is configured. A TTL that cannot be represented is
/// an error, never a non-expiring session.
pub fn session_expiry(
    now: DateTime<Utc>,
    ttl: Option<Duration>,
) -> Result<Option<DateTime<Utc>>> {
    let Some(ttl) = ttl else {
        return Ok(None);
    };

    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .map(Some)
        .ok_or_else(|| AppError::Internal(format!("Session TTL {:?} is out of range", ttl)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expired_at: Option<DateTime<Utc>>) -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "token".to_string(),
            created_at: Utc::now(),
            expired_at,
        }
    }

    #[test]
    fn test_null_expiry_is_active() {
        assert!(session(None).is_active_at(Utc::now()));
    }

    #[test]
    fn test_future_expiry_is_active() {
        let now = Utc::now();
        assert!(session(Some(now + chrono::Duration::minutes(5))).is_active_at(now));
    }

    #[test]
    fn test_past_or_exact_expiry_is_inactive() {
        let now = Utc::now();
        assert!(!session(Some(now - chrono::Duration::seconds(1))).is_active_at(now));
        assert!(!session(Some(now)).is_active_at(now));
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        assert_eq!(session_expiry(now, None).unwrap(), None);
        assert_eq!(
            session_expiry(now, Some(Duration::from_secs(60))).unwrap(),
            Some(now + chrono::Duration::seconds(60))
        );
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error_not_a_permanent_session() {
        let now = Utc::now();

        let result = session_expiry(now, Some(Duration::from_secs(u64::MAX / 2)));
        assert!(matches!(result, Err(AppError::Internal(_))));

        let result = session_expiry(DateTime::<Utc>::MAX_UTC, Some(Duration::from_secs(1)));
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
