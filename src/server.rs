//! Server wiring: pool, migrations, workers, router, graceful shutdown.

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;

use crate::api::routes::build_router;
use crate::application::services::{AuthService, LinkService, TokenSigner};
use crate::config::Config;
use crate::domain::cleanup_worker::{CleanupSchedule, run_cleanup_worker};
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::{LinkRepository, SessionRepository, UserRepository};
use crate::infrastructure::cache::{OtpStore, ResolutionCache, RestrictionCache};
use crate::infrastructure::persistence::{
    PgLinkRepository, PgSessionRepository, PgUserRepository,
};
use crate::state::AppState;
use crate::utils::short_id::{self, ShortIdGenerator};
use crate::utils::url_guard::UrlGuard;

pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    warn_on_collision_risk(&config);

    let links: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let sessions: Arc<dyn SessionRepository> = Arc::new(PgSessionRepository::new(pool.clone()));

    let tokens = Arc::new(TokenSigner::new(
        &config.jwt_access_secret,
        &config.jwt_refresh_secret,
        &config.jwt_guest_secret,
        config.access_token_ttl_seconds,
        config.refresh_token_ttl_seconds,
    ));

    let restrictions = Arc::new(RestrictionCache::new(
        100_000,
        Duration::from_secs(config.restriction_ttl_seconds),
    ));
    let otp = Arc::new(OtpStore::new(
        100_000,
        Duration::from_secs(config.otp_ttl_seconds),
        Duration::from_secs(config.otp_cooldown_seconds),
    ));

    let link_service = Arc::new(LinkService::new(
        links.clone(),
        ResolutionCache::new(
            config.url_cache_capacity,
            Duration::from_secs(config.url_cache_ttl_seconds),
        ),
        UrlGuard::new(
            config.service_host(),
            Duration::from_secs(config.dns_timeout_seconds),
        ),
        ShortIdGenerator::new(config.short_id_length, config.short_id_secure)
            .context("Invalid short id configuration")?,
        tokens.clone(),
    ));

    let auth_service = Arc::new(AuthService::new(
        users,
        sessions.clone(),
        otp,
        restrictions.clone(),
        tokens.clone(),
        &config.jwt_refresh_secret,
        config.max_login_attempts,
        config.otp_cooldown_seconds,
        config.restriction_ttl_seconds,
    ));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    let click_worker = tokio::spawn(run_click_worker(click_rx, links.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup_worker = tokio::spawn(run_cleanup_worker(
        CleanupSchedule {
            initial_delay: Duration::from_secs(config.cleanup_initial_delay_seconds),
            interval: Duration::from_secs(config.cleanup_interval_seconds),
            link_retention_days: config.link_retention_days,
        },
        links,
        sessions,
        shutdown_rx,
    ));

    let listen_addr = config.listen_addr.clone();
    let state = AppState {
        click_queue_capacity: config.click_queue_capacity,
        config: Arc::new(config),
        db: pool,
        link_service,
        auth_service,
        restrictions,
        tokens,
        click_tx,
    };

    let router = build_router(state);
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    tracing::info!("Listening on {}", listen_addr);

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Shutting down workers");
    let _ = shutdown_tx.send(true);
    let _ = cleanup_worker.await;
    // Dropping the state closed the click channel; the worker drains and exits.
    let _ = click_worker.await;

    Ok(())
}

fn warn_on_collision_risk(config: &Config) {
    let probability = short_id::collision_probability(config.short_id_length, 1_000_000);
    if probability > 0.001 {
        tracing::warn!(
            length = config.short_id_length,
            probability = format!("{:.4}%", probability * 100.0),
            "Short id collision probability for 1M ids exceeds 0.1%; consider a longer SHORT_ID_LENGTH"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
