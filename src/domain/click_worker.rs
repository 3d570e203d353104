//! Background click recording.
//!
//! Redirect handlers stay on the hot path: they push a [`ClickEvent`] into a
//! bounded channel and return immediately. This worker drains the channel
//! and applies each event as one atomic UPDATE. A full channel drops the
//! event (redirects never block on analytics).

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;

pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<dyn LinkRepository>,
) {
    tracing::info!("Click worker started");

    while let Some(event) = rx.recv().await {
        if let Err(e) = repository.record_click(&event).await {
            // A failed write loses one click; the link itself is unaffected.
            tracing::warn!(short = %event.short, error = %e, "Failed to record click");
        }
    }

    tracing::info!("Click worker stopped (channel closed)");
}
