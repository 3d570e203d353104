//! URL shortener backend: short links with click analytics, OTP-gated
//! accounts, guest attribution and in-memory abuse restrictions.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod server;
pub mod state;
pub mod utils;
