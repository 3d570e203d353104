//! Small shared helpers: id generation, URL validation, cookies, UA parsing.

pub mod cookies;
pub mod short_id;
pub mod url_guard;
pub mod user_agent;
