//! Refresh session entity.
//!
//! A session pairs an opaque session id (carried inside the refresh JWT)
//! with an HMAC hash of the refresh token it was issued with. Refresh
//! touches `last_used`; logout sets `revoked`.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque URL-safe id, generated from 32 random bytes.
    pub id: String,
    pub user_id: i64,
    /// HMAC-SHA256 of the refresh token, hex-encoded.
    pub refresh_token_hash: String,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: String,
    pub user_id: i64,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_usability() {
        let now = Utc::now();
        let mut session = Session {
            id: "sess".into(),
            user_id: 1,
            refresh_token_hash: "ab".into(),
            revoked: false,
            created_at: now,
            last_used: None,
            expires_at: now + Duration::days(7),
        };

        assert!(session.is_usable(now));
        assert!(!session.is_usable(now + Duration::days(8)));

        session.revoked = true;
        assert!(!session.is_usable(now));
    }
}
