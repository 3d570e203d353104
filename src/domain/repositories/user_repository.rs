//! Account persistence trait.

use async_trait::async_trait;

use crate::domain::entities::{NewUser, User};
use crate::error::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts an account. A duplicate email surfaces as a conflict error.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Replaces the password hash. Returns false when the email is unknown.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool, AppError>;
}
