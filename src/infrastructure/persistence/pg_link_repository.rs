//! Postgres-backed link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{Attribution, LinkAnalytics, LinkStatus, NewLink, ShortLink};
use crate::domain::repositories::{CreateLinkOutcome, LinkRepository};
use crate::error::{AppError, is_unique_violation_on_short, map_sqlx_error};

const LINK_COLUMNS: &str = "id, short, full_url, user_id, guest_id, status, expires_at, \
     clicks, analytics, created_at, last_clicked";

/// Filter for the redirect and listing paths: resolvable links are active
/// and not past their optional expiry.
const RESOLVABLE: &str = "status = 'active' AND (expires_at IS NULL OR expires_at > now())";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    short: String,
    full_url: String,
    user_id: Option<i64>,
    guest_id: Option<String>,
    status: String,
    expires_at: Option<DateTime<Utc>>,
    clicks: i64,
    analytics: serde_json::Value,
    created_at: DateTime<Utc>,
    last_clicked: Option<DateTime<Utc>>,
}

impl TryFrom<LinkRow> for ShortLink {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, AppError> {
        // The CHECK constraint guarantees exactly one of these; a row that
        // violates it anyway is corrupt and must not be served.
        let attribution = match (row.user_id, row.guest_id) {
            (Some(user_id), None) => Attribution::Owner(user_id),
            (None, Some(guest_id)) => Attribution::Guest(guest_id),
            _ => {
                return Err(AppError::internal(
                    "Link row has invalid attribution",
                    json!({ "id": row.id }),
                ));
            }
        };

        let status = match row.status.as_str() {
            "active" => LinkStatus::Active,
            "inactive" => LinkStatus::Inactive,
            "blocked" => LinkStatus::Blocked,
            other => {
                return Err(AppError::internal(
                    "Link row has unknown status",
                    json!({ "id": row.id, "status": other }),
                ));
            }
        };

        let analytics: LinkAnalytics = serde_json::from_value(row.analytics)
            .map_err(|e| AppError::internal("Corrupt analytics column", json!({ "id": row.id, "reason": e.to_string() })))?;

        Ok(ShortLink {
            id: row.id,
            short: row.short,
            full_url: row.full_url,
            attribution,
            status,
            expires_at: row.expires_at,
            clicks: row.clicks,
            analytics,
            created_at: row.created_at,
            last_clicked: row.last_clicked,
        })
    }
}

pub struct PgLinkRepository {
    pool: PgPool,
}

impl PgLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, link: NewLink) -> Result<CreateLinkOutcome, AppError> {
        let query = format!(
            "INSERT INTO links (short, full_url, user_id, guest_id) \
             VALUES ($1, $2, $3, $4) RETURNING {LINK_COLUMNS}"
        );

        let result = sqlx::query_as::<_, LinkRow>(&query)
            .bind(&link.short)
            .bind(&link.full_url)
            .bind(link.attribution.user_id())
            .bind(link.attribution.guest_id())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(CreateLinkOutcome::Created(row.try_into()?)),
            Err(e) if is_unique_violation_on_short(&e) => Ok(CreateLinkOutcome::ShortTaken),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn find_active_by_short(&self, short: &str) -> Result<Option<ShortLink>, AppError> {
        let query =
            format!("SELECT {LINK_COLUMNS} FROM links WHERE short = $1 AND {RESOLVABLE}");

        let row = sqlx::query_as::<_, LinkRow>(&query)
            .bind(short)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(ShortLink::try_from).transpose()
    }

    async fn find_by_short(&self, short: &str) -> Result<Option<ShortLink>, AppError> {
        let query = format!("SELECT {LINK_COLUMNS} FROM links WHERE short = $1");

        let row = sqlx::query_as::<_, LinkRow>(&query)
            .bind(short)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(ShortLink::try_from).transpose()
    }

    async fn record_click(&self, event: &ClickEvent) -> Result<(), AppError> {
        // One statement per click: counter, timestamp and all four analytics
        // buckets move together, so concurrent clicks can never lose updates.
        let query = "\
            UPDATE links SET \
                clicks = clicks + 1, \
                last_clicked = $2, \
                analytics = jsonb_build_object( \
                    'countries', jsonb_set(COALESCE(analytics->'countries', '{}'::jsonb), ARRAY[$3], \
                        to_jsonb(COALESCE((analytics->'countries'->>$3)::bigint, 0) + 1)), \
                    'referrers', jsonb_set(COALESCE(analytics->'referrers', '{}'::jsonb), ARRAY[$4], \
                        to_jsonb(COALESCE((analytics->'referrers'->>$4)::bigint, 0) + 1)), \
                    'browsers', jsonb_set(COALESCE(analytics->'browsers', '{}'::jsonb), ARRAY[$5], \
                        to_jsonb(COALESCE((analytics->'browsers'->>$5)::bigint, 0) + 1)), \
                    'devices', jsonb_set(COALESCE(analytics->'devices', '{}'::jsonb), ARRAY[$6], \
                        to_jsonb(COALESCE((analytics->'devices'->>$6)::bigint, 0) + 1)) \
                ) \
            WHERE short = $1";

        sqlx::query(query)
            .bind(&event.short)
            .bind(event.at)
            .bind(&event.country)
            .bind(event.referrer_key())
            .bind(&event.browser)
            .bind(&event.device)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn soft_delete(&self, short: &str, deleted_by: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE links SET status = 'inactive', deleted_at = now(), deleted_by = $2 \
             WHERE short = $1 AND status = 'active'",
        )
        .bind(short)
        .bind(deleted_by)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_attribution(
        &self,
        attribution: &Attribution,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ShortLink>, i64), AppError> {
        let (filter, total_query) = match attribution {
            Attribution::Owner(_) => (
                format!(
                    "SELECT {LINK_COLUMNS} FROM links \
                     WHERE user_id = $1 AND {RESOLVABLE} \
                     ORDER BY created_at DESC OFFSET $2 LIMIT $3"
                ),
                format!("SELECT COUNT(*) FROM links WHERE user_id = $1 AND {RESOLVABLE}"),
            ),
            Attribution::Guest(_) => (
                format!(
                    "SELECT {LINK_COLUMNS} FROM links \
                     WHERE guest_id = $1 AND {RESOLVABLE} \
                     ORDER BY created_at DESC OFFSET $2 LIMIT $3"
                ),
                format!("SELECT COUNT(*) FROM links WHERE guest_id = $1 AND {RESOLVABLE}"),
            ),
        };

        let (rows, total) = match attribution {
            Attribution::Owner(user_id) => {
                let rows = sqlx::query_as::<_, LinkRow>(&filter)
                    .bind(user_id)
                    .bind(offset)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;
                let total: (i64,) = sqlx::query_as(&total_query)
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;
                (rows, total.0)
            }
            Attribution::Guest(guest_id) => {
                let rows = sqlx::query_as::<_, LinkRow>(&filter)
                    .bind(guest_id)
                    .bind(offset)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;
                let total: (i64,) = sqlx::query_as(&total_query)
                    .bind(guest_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;
                (rows, total.0)
            }
        };

        let links = rows
            .into_iter()
            .map(ShortLink::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((links, total))
    }

    async fn reassign_guest(&self, guest_id: &str, user_id: i64) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE links SET user_id = $2, guest_id = NULL WHERE guest_id = $1")
                .bind(guest_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE COALESCE(last_clicked, created_at) < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
