//! Cookie helpers.
//!
//! Auth state travels in three HttpOnly cookies: `accessToken` (short-lived
//! JWT), `token` (refresh session id) and `guestId` (guest JWT). All are
//! `Secure; SameSite=Strict; Path=/`.

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "token";
pub const GUEST_COOKIE: &str = "guestId";

/// Extracts a cookie value from a `Cookie` request header.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

/// Builds a `Set-Cookie` value for an auth cookie with the given lifetime.
pub fn build_cookie(name: &str, value: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=Strict",
        name, value, max_age_secs
    )
}

/// Builds a `Set-Cookie` value that deletes the named cookie.
pub fn clear_cookie(name: &str) -> String {
    format!(
        "{}=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=Strict",
        name
    )
}
