pub mod admin;
pub mod auth;

pub use admin::admin_guard;
pub use auth::{Identity, identity_middleware};
