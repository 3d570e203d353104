//! Coarse user-agent classification for click analytics.
//!
//! Analytics only needs family buckets, not full UA parsing. Order matters:
//! Chrome's UA contains "Safari", Edge's contains "Chrome", and so on.

/// Browser family from a `User-Agent` header.
pub fn browser_family(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();

    if ua.contains("firefox") && !ua.contains("seamonkey") {
        "Firefox"
    } else if ua.contains("edg") {
        "Edge"
    } else if ua.contains("opr") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("chrome") || ua.contains("chromium") || ua.contains("crios") {
        "Chrome"
    } else if ua.contains("safari") {
        "Safari"
    } else if ua.is_empty() {
        "unknown"
    } else {
        "other"
    }
}

/// Device class from a `User-Agent` header.
pub fn device_family(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();

    if ua.contains("ipad") || (ua.contains("tablet") && !ua.contains("mobile")) {
        "tablet"
    } else if ua.contains("android") && !ua.contains("mobile") {
        // Android without "Mobile" is the tablet form factor.
        "tablet"
    } else if ua.contains("mobile") || ua.contains("iphone") || ua.contains("android") {
        "mobile"
    } else if ua.is_empty() {
        "unknown"
    } else {
        "desktop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
    const EDGE: &str = "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) \
                        Chrome/124.0 Safari/537.36 Edg/124.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                                 AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 \
                                 Mobile/15E148 Safari/604.1";
    const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";
    const ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

    #[test]
    fn test_browser_families() {
        assert_eq!(browser_family(CHROME_DESKTOP), "Chrome");
        assert_eq!(browser_family(EDGE), "Edge");
        assert_eq!(browser_family(SAFARI_IPHONE), "Safari");
        assert_eq!(browser_family(FIREFOX), "Firefox");
        assert_eq!(browser_family(""), "unknown");
        assert_eq!(browser_family("curl/8.0"), "other");
    }

    #[test]
    fn test_device_families() {
        assert_eq!(device_family(CHROME_DESKTOP), "desktop");
        assert_eq!(device_family(SAFARI_IPHONE), "mobile");
        assert_eq!(device_family(ANDROID_TABLET), "tablet");
        assert_eq!(device_family(""), "unknown");
    }
}
