use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::crypto::secrets_match;

/// Each second of recorded video buys 15 minutes of link lifetime.
pub const EXPIRY_MINUTES_PER_DURATION_SEC: i64 = 15;

/// Signed playback URL lifetime once a token is redeemed (24 hours).
pub const PLAYBACK_URL_TTL_SECS: u32 = 24 * 60 * 60;

/// A password-gated, single-redemption, time-limited grant to view one
/// stored video.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoAccessToken {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub question_index: i32,
    pub storage_path: String,
    pub password: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionError {
    WrongPassword,
    Expired,
    AlreadyUsed,
}

impl VideoAccessToken {
    pub fn expiry_for(duration_sec: i64, minted_at: DateTime<Utc>) -> DateTime<Utc> {
        minted_at + Duration::minutes(duration_sec * EXPIRY_MINUTES_PER_DURATION_SEC)
    }

    /// The redemption check sequence: password, then expiry, then the used
    /// flag. Order matters so each failure maps to its own status code, and
    /// a failed attempt never consumes the token.
    pub fn check_redemption(&self, password: &str, now: DateTime<Utc>) -> Result<(), RedemptionError> {
        if !secrets_match(&self.password, password) {
            return Err(RedemptionError::WrongPassword);
        }
        if now > self.expires_at {
            return Err(RedemptionError::Expired);
        }
        if self.is_used {
            return Err(RedemptionError::AlreadyUsed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(password: &str, expires_in_minutes: i64, is_used: bool) -> VideoAccessToken {
        let now = Utc::now();
        VideoAccessToken {
            id: Uuid::new_v4(),
            assessment_id: Uuid::new_v4(),
            question_index: 1,
            storage_path: "videos/a/q2-1.webm".to_string(),
            password: password.to_string(),
            expires_at: now + Duration::minutes(expires_in_minutes),
            is_used,
            accessed_at: None,
            created_at: now,
        }
    }

    #[test]
    fn expiry_scales_with_video_duration() {
        let minted = Utc::now();
        let expires = VideoAccessToken::expiry_for(60, minted);
        assert_eq!(expires - minted, Duration::minutes(900));
    }

    #[test]
    fn correct_password_on_live_unused_token_succeeds() {
        let t = token("QX7K2M", 30, false);
        assert!(t.check_redemption("QX7K2M", Utc::now()).is_ok());
    }

    #[test]
    fn wrong_password_is_reported_before_expiry_or_used() {
        let expired_and_used = {
            let mut t = token("QX7K2M", -5, true);
            t.accessed_at = Some(Utc::now());
            t
        };
        assert_eq!(
            expired_and_used.check_redemption("WRONG1", Utc::now()),
            Err(RedemptionError::WrongPassword)
        );
    }

    #[test]
    fn expired_token_rejects_even_with_correct_password() {
        let t = token("QX7K2M", -1, false);
        assert_eq!(
            t.check_redemption("QX7K2M", Utc::now()),
            Err(RedemptionError::Expired)
        );
    }

    #[test]
    fn used_token_rejects_even_with_correct_password() {
        let t = token("QX7K2M", 30, true);
        assert_eq!(
            t.check_redemption("QX7K2M", Utc::now()),
            Err(RedemptionError::AlreadyUsed)
        );
    }

    #[test]
    fn password_comparison_is_case_sensitive() {
        let t = token("QX7K2M", 30, false);
        assert_eq!(
            t.check_redemption("qx7k2m", Utc::now()),
            Err(RedemptionError::WrongPassword)
        );
    }
}
