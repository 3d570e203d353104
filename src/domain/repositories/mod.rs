pub mod link_repository;
pub mod session_repository;
pub mod user_repository;

pub use link_repository::{CreateLinkOutcome, LinkRepository};
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use session_repository::MockSessionRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
