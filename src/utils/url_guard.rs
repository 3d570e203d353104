//! Destination URL validation.
//!
//! A destination must be a well-formed http(s) URL, must not point back at
//! this service's own host (redirect loops), and its host must resolve in
//! DNS within a bounded timeout. Validation runs once per create request,
//! before any collision-retry loop.

use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::error::AppError;

/// Outcome of a successful validation: the normalized URL plus its host.
#[derive(Debug, Clone)]
pub struct ValidatedUrl {
    pub url: String,
    pub host: String,
}

/// Validates and normalizes a destination URL.
pub struct UrlGuard {
    /// Lowercased host of this deployment, rejected as a destination.
    service_host: String,
    dns_timeout: Duration,
    /// Disables the DNS probe; used in tests.
    skip_dns: bool,
}

impl UrlGuard {
    pub fn new(service_host: String, dns_timeout: Duration) -> Self {
        Self {
            service_host: service_host.to_ascii_lowercase(),
            dns_timeout,
            skip_dns: false,
        }
    }

    #[cfg(test)]
    pub fn without_dns(service_host: &str) -> Self {
        Self {
            service_host: service_host.to_ascii_lowercase(),
            dns_timeout: Duration::from_secs(1),
            skip_dns: true,
        }
    }

    /// Parses, normalizes and probes a destination.
    ///
    /// Scheme-less input gets `https://` prepended. Only `http` and `https`
    /// survive; anything else (including `javascript:`) is a validation
    /// error, as is a destination on the service's own host.
    pub async fn validate(&self, raw: &str) -> Result<ValidatedUrl, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::bad_request("URL must not be empty", json!({})));
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let parsed = Url::parse(&candidate).map_err(|e| {
            AppError::bad_request("Invalid URL", json!({ "url": raw, "reason": e.to_string() }))
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AppError::bad_request(
                    "Only http and https URLs can be shortened",
                    json!({ "scheme": other }),
                ));
            }
        }

        let host = parsed
            .host_str()
            .map(|h| h.to_ascii_lowercase())
            .ok_or_else(|| AppError::bad_request("URL must have a host", json!({ "url": raw })))?;

        if self.is_own_host(&host) {
            return Err(AppError::bad_request(
                "Destination must not point back at this service",
                json!({ "host": host }),
            ));
        }

        if !self.skip_dns {
            self.probe_dns(&host).await?;
        }

        Ok(ValidatedUrl {
            url: parsed.to_string(),
            host,
        })
    }

    /// True when `host` equals this service's host or a subdomain of it.
    pub fn is_own_host(&self, host: &str) -> bool {
        if self.service_host.is_empty() {
            return false;
        }
        host == self.service_host || host.ends_with(&format!(".{}", self.service_host))
    }

    async fn probe_dns(&self, host: &str) -> Result<(), AppError> {
        // The port is irrelevant; lookup_host needs one to parse the input.
        let target = format!("{}:443", host);
        let lookup = tokio::net::lookup_host(target);

        match tokio::time::timeout(self.dns_timeout, lookup).await {
            Ok(Ok(mut addrs)) => {
                if addrs.next().is_some() {
                    Ok(())
                } else {
                    Err(AppError::bad_request(
                        "Host does not resolve",
                        json!({ "host": host }),
                    ))
                }
            }
            Ok(Err(_)) => Err(AppError::bad_request(
                "Host does not resolve",
                json!({ "host": host }),
            )),
            Err(_) => Err(AppError::bad_request(
                "Host lookup timed out",
                json!({ "host": host, "timeoutSecs": self.dns_timeout.as_secs() }),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> UrlGuard {
        UrlGuard::without_dns("lnk.example.com")
    }

    #[tokio::test]
    async fn test_prepends_https_when_scheme_missing() {
        let validated = guard().validate("example.com/page").await.unwrap();
        assert_eq!(validated.url, "https://example.com/page");
        assert_eq!(validated.host, "example.com");
    }

    #[tokio::test]
    async fn test_keeps_explicit_http() {
        let validated = guard().validate("http://example.com").await.unwrap();
        assert!(validated.url.starts_with("http://"));
    }

    #[tokio::test]
    async fn test_rejects_non_http_schemes() {
        for bad in ["javascript:alert(1)", "ftp://example.com", "file:///etc/passwd"] {
            let err = guard().validate(bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }), "accepted {bad}");
        }
    }

    #[tokio::test]
    async fn test_rejects_own_host_and_subdomains() {
        let g = guard();
        assert!(g.validate("https://lnk.example.com/abc").await.is_err());
        assert!(g.validate("https://LNK.Example.COM/abc").await.is_err());
        assert!(g.validate("https://api.lnk.example.com").await.is_err());
        // A host that merely ends with the same string is fine.
        assert!(g.validate("https://notlnk.example.org").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_empty_and_garbage() {
        assert!(guard().validate("   ").await.is_err());
        assert!(guard().validate("http://").await.is_err());
    }

    #[tokio::test]
    async fn test_dns_probe_real_failure() {
        let g = UrlGuard::new("lnk.example.com".to_string(), Duration::from_secs(5));
        let err = g
            .validate("https://this-host-does-not-exist.invalid")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
