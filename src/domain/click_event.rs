//! Click analytics event, queued on every successful redirect.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub short: String,
    /// Two-letter country code from the edge (`cf-ipcountry`), or "unknown".
    pub country: String,
    pub referrer: Option<String>,
    pub browser: String,
    pub device: String,
    pub at: DateTime<Utc>,
}

impl ClickEvent {
    /// Referrer bucket key for the aggregated analytics maps.
    pub fn referrer_key(&self) -> &str {
        self.referrer.as_deref().unwrap_or("direct")
    }
}
