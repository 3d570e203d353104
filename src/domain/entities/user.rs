//! Registered account entity.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string; never serialized outward.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}
