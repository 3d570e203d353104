//! Short link entity and its attribution model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Who a link belongs to.
///
/// Exactly one of a registered owner or a guest cookie id. Modeling this as
/// an enum makes "both set" and "neither set" unrepresentable; the database
/// enforces the same with a CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    Owner(i64),
    Guest(String),
}

impl Attribution {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Owner(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    pub fn guest_id(&self) -> Option<&str> {
        match self {
            Self::Owner(_) => None,
            Self::Guest(id) => Some(id.as_str()),
        }
    }
}

/// Lifecycle state of a link. Inactive and blocked links keep their row
/// (and their short id reserved) for audit but stop resolving; blocked is
/// an operator action, inactive an owner delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Inactive,
    Blocked,
}

/// Per-link aggregated click analytics. Each map is category → count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAnalytics {
    #[serde(default)]
    pub countries: HashMap<String, i64>,
    #[serde(default)]
    pub referrers: HashMap<String, i64>,
    #[serde(default)]
    pub browsers: HashMap<String, i64>,
    #[serde(default)]
    pub devices: HashMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct ShortLink {
    pub id: i64,
    pub short: String,
    pub full_url: String,
    pub attribution: Attribution,
    pub status: LinkStatus,
    /// Optional hard stop; past it the link no longer resolves.
    pub expires_at: Option<DateTime<Utc>>,
    pub clicks: i64,
    pub analytics: LinkAnalytics,
    pub created_at: DateTime<Utc>,
    pub last_clicked: Option<DateTime<Utc>>,
}

impl ShortLink {
    pub fn is_active(&self) -> bool {
        self.status == LinkStatus::Active
    }

    /// Active and not past its expiry; only these links redirect.
    pub fn is_resolvable(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.expires_at.is_none_or(|t| t > now)
    }

    /// True when `identity` may manage (delete, inspect) this link.
    pub fn owned_by(&self, attribution: &Attribution) -> bool {
        self.attribution == *attribution
    }
}

/// Input for link creation; the repository assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short: String,
    pub full_url: String,
    pub attribution: Attribution,
}
