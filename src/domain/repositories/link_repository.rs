//! Link persistence trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{Attribution, NewLink, ShortLink};
use crate::error::AppError;

/// Result of an insert attempt. A taken short id is not an error at this
/// layer: generated ids retry, aliases surface a conflict.
#[derive(Debug)]
pub enum CreateLinkOutcome {
    Created(ShortLink),
    ShortTaken,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn create(&self, link: NewLink) -> Result<CreateLinkOutcome, AppError>;

    /// Looks up an active link only; deleted links do not resolve.
    async fn find_active_by_short(&self, short: &str) -> Result<Option<ShortLink>, AppError>;

    /// Looks up a link regardless of status, for management operations.
    async fn find_by_short(&self, short: &str) -> Result<Option<ShortLink>, AppError>;

    /// Applies one click atomically: increments the counter, bumps
    /// `last_clicked` and merges the analytics buckets in a single UPDATE.
    async fn record_click(&self, event: &ClickEvent) -> Result<(), AppError>;

    /// Marks a link inactive, recording when and by whom. Returns false
    /// when no active row matched.
    async fn soft_delete(&self, short: &str, deleted_by: &str) -> Result<bool, AppError>;

    /// Pages through an owner's or guest's active links, newest first.
    /// Returns the page plus the total active count for that attribution.
    async fn list_by_attribution(
        &self,
        attribution: &Attribution,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ShortLink>, i64), AppError>;

    /// Moves all of a guest's links to a registered owner. Returns the
    /// number of rows moved.
    async fn reassign_guest(&self, guest_id: &str, user_id: i64) -> Result<u64, AppError>;

    /// Hard-deletes links whose last activity predates `cutoff` (falling
    /// back to creation time for never-clicked links). Returns rows removed.
    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}
