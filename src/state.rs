//! Shared application state handed to every handler.

use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{AuthService, LinkService, TokenSigner};
use crate::config::Config;
use crate::domain::click_event::ClickEvent;
use crate::infrastructure::cache::RestrictionCache;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: PgPool,
    pub link_service: Arc<LinkService>,
    pub auth_service: Arc<AuthService>,
    pub restrictions: Arc<RestrictionCache>,
    pub tokens: Arc<TokenSigner>,
    /// Producer side of the click worker channel. Handlers `try_send` and
    /// drop on overflow.
    pub click_tx: mpsc::Sender<ClickEvent>,
    /// Total channel capacity, reported by the health endpoint.
    pub click_queue_capacity: usize,
}
