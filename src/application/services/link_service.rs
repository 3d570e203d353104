//! Link lifecycle orchestration: create, resolve, delete, list, migrate.

use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{Attribution, NewLink, ShortLink};
use crate::domain::repositories::{CreateLinkOutcome, LinkRepository};
use crate::error::AppError;
use crate::infrastructure::cache::ResolutionCache;
use crate::utils::short_id::ShortIdGenerator;
use crate::utils::url_guard::UrlGuard;

use super::tokens::TokenSigner;

/// Insert attempts for a generated id before giving up. Alias creation
/// never retries.
const MAX_CREATE_ATTEMPTS: u32 = 3;

/// Route words an alias must not shadow.
const RESERVED_ALIASES: &[&str] = &["url", "auth", "admin", "health"];

#[derive(Debug)]
pub struct LinkPage {
    pub data: Vec<ShortLink>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_urls: i64,
    pub has_more: bool,
}

pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    cache: ResolutionCache,
    guard: UrlGuard,
    generator: ShortIdGenerator,
    tokens: Arc<TokenSigner>,
}

impl LinkService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: ResolutionCache,
        guard: UrlGuard,
        generator: ShortIdGenerator,
        tokens: Arc<TokenSigner>,
    ) -> Self {
        Self {
            links,
            cache,
            guard,
            generator,
            tokens,
        }
    }

    /// Shortens a destination.
    ///
    /// Validation (including the DNS probe) runs exactly once; collision
    /// retries reuse the validated URL. An alias gets a single insert
    /// attempt and a taken alias is a conflict; generated ids retry up to
    /// [`MAX_CREATE_ATTEMPTS`] times before reporting capacity exhaustion.
    pub async fn create(
        &self,
        raw_url: &str,
        alias: Option<&str>,
        attribution: Attribution,
    ) -> Result<ShortLink, AppError> {
        let validated = self.guard.validate(raw_url).await?;

        if let Some(alias) = alias {
            validate_alias(alias)?;

            let outcome = self
                .links
                .create(NewLink {
                    short: alias.to_string(),
                    full_url: validated.url.clone(),
                    attribution,
                })
                .await?;

            return match outcome {
                CreateLinkOutcome::Created(link) => {
                    self.cache.insert(&link.short, &link.full_url);
                    Ok(link)
                }
                CreateLinkOutcome::ShortTaken => Err(AppError::conflict(
                    "This alias is already taken",
                    json!({ "alias": alias }),
                )),
            };
        }

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let short = self.generator.generate();
            let outcome = self
                .links
                .create(NewLink {
                    short,
                    full_url: validated.url.clone(),
                    attribution: attribution.clone(),
                })
                .await?;

            match outcome {
                CreateLinkOutcome::Created(link) => {
                    self.cache.insert(&link.short, &link.full_url);
                    return Ok(link);
                }
                CreateLinkOutcome::ShortTaken => {
                    tracing::warn!(attempt, "Generated short id collided, retrying");
                }
            }
        }

        Err(AppError::internal(
            "Could not allocate a short id",
            json!({ "attempts": MAX_CREATE_ATTEMPTS }),
        ))
    }

    /// Resolves a short id to its destination for redirecting.
    ///
    /// The anti-loop check runs on cache hits too: a destination stored
    /// before a base-url change must not start looping.
    pub async fn resolve(&self, short: &str) -> Result<String, AppError> {
        if let Some(url) = self.cache.get(short) {
            self.reject_loop(&url)?;
            return Ok(url);
        }

        let link = self
            .links
            .find_active_by_short(short)
            .await?
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "short": short })))?;

        self.reject_loop(&link.full_url)?;
        self.cache.insert(&link.short, &link.full_url);
        Ok(link.full_url)
    }

    fn reject_loop(&self, destination: &str) -> Result<(), AppError> {
        let host = url::Url::parse(destination)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));

        if let Some(host) = host {
            if self.guard.is_own_host(&host) {
                return Err(AppError::bad_request(
                    "Destination loops back to this service",
                    json!({ "host": host }),
                ));
            }
        }

        Ok(())
    }

    /// Soft-deletes a link after an exact attribution match.
    pub async fn delete(&self, short: &str, requester: &Attribution) -> Result<(), AppError> {
        let link = self
            .links
            .find_by_short(short)
            .await?
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "short": short })))?;

        if !link.owned_by(requester) {
            return Err(AppError::forbidden(
                "You do not own this short URL",
                json!({ "short": short }),
            ));
        }

        if !link.is_active() {
            return Err(AppError::not_found(
                "Short URL not found",
                json!({ "short": short }),
            ));
        }

        let deleted_by = match requester {
            Attribution::Owner(id) => format!("user:{id}"),
            Attribution::Guest(id) => format!("guest:{id}"),
        };
        self.links.soft_delete(short, &deleted_by).await?;
        self.cache.invalidate(short);
        Ok(())
    }

    /// Pages through a requester's active links, newest first.
    pub async fn list(
        &self,
        attribution: &Attribution,
        page: i64,
        limit: i64,
    ) -> Result<LinkPage, AppError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        let (data, total_urls) = self.links.list_by_attribution(attribution, offset, limit).await?;

        let total_pages = if total_urls == 0 {
            0
        } else {
            (total_urls + limit - 1) / limit
        };

        Ok(LinkPage {
            has_more: page < total_pages,
            data,
            current_page: page,
            total_pages,
            total_urls,
        })
    }

    /// Moves a guest's links to a freshly authenticated account.
    ///
    /// Never fails: a stale or forged guest cookie must not break
    /// registration or login. Returns the number of links moved.
    pub async fn migrate_guest_urls(&self, guest_token: &str, user_id: i64) -> u64 {
        let claims = match self.tokens.verify_guest(guest_token) {
            Ok(claims) => claims,
            Err(_) => {
                tracing::debug!("Skipping guest migration: invalid guest token");
                return 0;
            }
        };

        self.do_migrate(&claims.sub, user_id).await
    }

    async fn do_migrate(&self, guest_id: &str, user_id: i64) -> u64 {
        match self.links.reassign_guest(guest_id, user_id).await {
            Ok(moved) => {
                if moved > 0 {
                    tracing::info!(moved, user_id, "Migrated guest links");
                }
                moved
            }
            Err(e) => {
                tracing::warn!(error = %e, "Guest link migration failed");
                0
            }
        }
    }
}

fn validate_alias(alias: &str) -> Result<(), AppError> {
    let shape_ok = (4..=12).contains(&alias.len())
        && alias
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if !shape_ok {
        return Err(AppError::bad_request(
            "Alias must be 4-12 characters of letters, digits, '-' or '_'",
            json!({ "alias": alias }),
        ));
    }

    if RESERVED_ALIASES.contains(&alias.to_ascii_lowercase().as_str()) {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}
