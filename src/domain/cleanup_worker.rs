//! Periodic retention cleanup.
//!
//! On a schedule (default daily, after an initial delay) the worker removes
//! links whose last activity predates the retention window and sessions
//! past their expiry. Each cycle runs in its own task and reports back over
//! a oneshot channel, so a panicking cycle cannot take the scheduler down.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

use crate::domain::repositories::{LinkRepository, SessionRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub links_deleted: u64,
    pub sessions_deleted: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct CleanupSchedule {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub link_retention_days: i64,
}

pub async fn run_cleanup_worker(
    schedule: CleanupSchedule,
    links: Arc<dyn LinkRepository>,
    sessions: Arc<dyn SessionRepository>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(
        interval_secs = schedule.interval.as_secs(),
        retention_days = schedule.link_retention_days,
        "Cleanup worker started"
    );

    tokio::select! {
        _ = tokio::time::sleep(schedule.initial_delay) => {}
        _ = shutdown.changed() => {
            tracing::info!("Cleanup worker stopped before first run");
            return;
        }
    }

    let mut ticker = tokio::time::interval(schedule.interval);
    loop {
        run_isolated_cycle(schedule, links.clone(), sessions.clone()).await;

        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                tracing::info!("Cleanup worker stopped");
                return;
            }
        }
    }
}

/// Runs one cycle in a separate task. A panic there is observed here as a
/// dropped sender and logged; the schedule continues.
async fn run_isolated_cycle(
    schedule: CleanupSchedule,
    links: Arc<dyn LinkRepository>,
    sessions: Arc<dyn SessionRepository>,
) {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let report = run_cycle(schedule.link_retention_days, links, sessions).await;
        let _ = tx.send(report);
    });

    match rx.await {
        Ok(Ok(report)) => {
            tracing::info!(
                links = report.links_deleted,
                sessions = report.sessions_deleted,
                "Cleanup cycle finished"
            );
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Cleanup cycle failed");
        }
        Err(_) => {
            tracing::error!("Cleanup cycle task died without reporting");
        }
    }
}

async fn run_cycle(
    retention_days: i64,
    links: Arc<dyn LinkRepository>,
    sessions: Arc<dyn SessionRepository>,
) -> Result<CleanupReport, crate::error::AppError> {
    let now = Utc::now();
    let cutoff = now - ChronoDuration::days(retention_days);

    let links_deleted = links.delete_stale(cutoff).await?;
    let sessions_deleted = sessions.delete_expired(now).await?;

    Ok(CleanupReport {
        links_deleted,
        sessions_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockLinkRepository, MockSessionRepository};
    use chrono::DateTime;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_cycle_uses_retention_cutoff() {
        let seen_cutoff: Arc<Mutex<Option<DateTime<Utc>>>> = Arc::new(Mutex::new(None));
        let capture = seen_cutoff.clone();

        let mut links = MockLinkRepository::new();
        links.expect_delete_stale().returning(move |cutoff| {
            *capture.lock().unwrap() = Some(cutoff);
            Ok(3)
        });

        let mut sessions = MockSessionRepository::new();
        sessions.expect_delete_expired().returning(|_| Ok(2));

        let report = run_cycle(30, Arc::new(links), Arc::new(sessions))
            .await
            .unwrap();

        assert_eq!(
            report,
            CleanupReport {
                links_deleted: 3,
                sessions_deleted: 2
            }
        );

        let cutoff = seen_cutoff.lock().unwrap().unwrap();
        let age = Utc::now() - cutoff;
        assert!(age >= ChronoDuration::days(30));
        assert!(age < ChronoDuration::days(30) + ChronoDuration::minutes(1));
    }

    #[tokio::test]
    async fn test_cycle_error_does_not_stop_worker() {
        let mut links = MockLinkRepository::new();
        links
            .expect_delete_stale()
            .returning(|_| Err(crate::error::AppError::internal("db", serde_json::json!({}))));
        let sessions = MockSessionRepository::new();

        let schedule = CleanupSchedule {
            initial_delay: Duration::from_millis(0),
            interval: Duration::from_secs(3600),
            link_retention_days: 30,
        };

        // One failing cycle, then shut down; the worker must exit cleanly.
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(run_cleanup_worker(
            schedule,
            Arc::new(links),
            Arc::new(sessions),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        worker.await.unwrap();
    }
}
