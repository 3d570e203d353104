//! JWT signing and verification.
//!
//! Three token families with distinct HS256 secrets: access (15 min,
//! carries email + user id + session id), refresh (7 days, carries the
//! session id) and guest (1 day, carries the guest id).

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;

const GUEST_TTL_SECS: u64 = 86_400;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account email.
    pub sub: String,
    pub uid: i64,
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Account email.
    pub sub: String,
    pub uid: i64,
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GuestClaims {
    /// Guest id from the `guestId` cookie.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenSigner {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    guest_secret: Vec<u8>,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        guest_secret: &str,
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
    ) -> Self {
        Self {
            access_secret: access_secret.as_bytes().to_vec(),
            refresh_secret: refresh_secret.as_bytes().to_vec(),
            guest_secret: guest_secret.as_bytes().to_vec(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs
    }

    pub fn guest_ttl_secs(&self) -> u64 {
        GUEST_TTL_SECS
    }

    fn sign<C: Serialize>(&self, secret: &[u8], claims: &C) -> Result<String, AppError> {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret))
            .map_err(|e| AppError::internal("Failed to sign token", json!({ "reason": e.to_string() })))
    }

    fn open<C: for<'de> Deserialize<'de>>(
        &self,
        secret: &[u8],
        token: &str,
    ) -> Result<C, AppError> {
        decode::<C>(token, &DecodingKey::from_secret(secret), &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::unauthorized("Invalid or expired token", json!({})))
    }

    pub fn issue_access(&self, email: &str, uid: i64, sid: &str) -> Result<String, AppError> {
        let now = Utc::now();
        self.sign(
            &self.access_secret,
            &AccessClaims {
                sub: email.to_string(),
                uid,
                sid: sid.to_string(),
                iat: now.timestamp(),
                exp: (now + Duration::seconds(self.access_ttl_secs as i64)).timestamp(),
            },
        )
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.open(&self.access_secret, token)
    }

    pub fn issue_refresh(&self, email: &str, uid: i64, sid: &str) -> Result<String, AppError> {
        let now = Utc::now();
        self.sign(
            &self.refresh_secret,
            &RefreshClaims {
                sub: email.to_string(),
                uid,
                sid: sid.to_string(),
                iat: now.timestamp(),
                exp: (now + Duration::seconds(self.refresh_ttl_secs as i64)).timestamp(),
            },
        )
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        self.open(&self.refresh_secret, token)
    }

    pub fn issue_guest(&self, guest_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        self.sign(
            &self.guest_secret,
            &GuestClaims {
                sub: guest_id.to_string(),
                iat: now.timestamp(),
                exp: (now + Duration::seconds(GUEST_TTL_SECS as i64)).timestamp(),
            },
        )
    }

    pub fn verify_guest(&self, token: &str) -> Result<GuestClaims, AppError> {
        self.open(&self.guest_secret, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("access", "refresh", "guest", 900, 604_800)
    }

    #[test]
    fn test_access_round_trip() {
        let s = signer();
        let token = s.issue_access("ada@example.com", 7, "sess-1").unwrap();
        let claims = s.verify_access(&token).unwrap();

        assert_eq!(claims.sub, "ada@example.com");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.sid, "sess-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_families_do_not_cross_verify() {
        let s = signer();
        let access = s.issue_access("a@b.c", 1, "sess").unwrap();
        let guest = s.issue_guest("g-abc").unwrap();

        assert!(s.verify_refresh(&access).is_err());
        assert!(s.verify_guest(&access).is_err());
        assert!(s.verify_access(&guest).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let s = signer();
        let mut token = s.issue_guest("g-abc").unwrap();
        token.push('x');
        assert!(s.verify_guest(&token).is_err());
    }
}
