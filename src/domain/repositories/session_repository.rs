//! Refresh session persistence trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{NewSession, Session};
use crate::error::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: NewSession) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError>;

    /// Records a successful refresh.
    async fn touch(&self, id: &str, used_at: DateTime<Utc>) -> Result<(), AppError>;

    async fn revoke(&self, id: &str) -> Result<(), AppError>;

    /// Removes sessions past their expiry. Returns rows removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
