//! Postgres-backed refresh session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::{NewSession, Session};
use crate::domain::repositories::SessionRepository;
use crate::error::{AppError, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: i64,
    refresh_token_hash: String,
    revoked: bool,
    created_at: DateTime<Utc>,
    last_used: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            user_id: row.user_id,
            refresh_token_hash: row.refresh_token_hash,
            revoked: row.revoked,
            created_at: row.created_at,
            last_used: row.last_used,
            expires_at: row.expires_at,
        }
    }
}

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: NewSession) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, refresh_token_hash, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(&session.refresh_token_hash)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, user_id, refresh_token_hash, revoked, created_at, last_used, expires_at \
             FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Session::from))
    }

    async fn touch(&self, id: &str, used_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET last_used = $2 WHERE id = $1")
            .bind(id)
            .bind(used_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn revoke(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET revoked = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1 OR revoked")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
