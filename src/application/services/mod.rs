pub mod auth_service;
pub mod link_service;
pub mod tokens;

pub use auth_service::{AuthService, AuthSession};
pub use link_service::{LinkPage, LinkService};
pub use tokens::TokenSigner;
