//! Browser-like request fingerprints.
//!
//! Each page request gets a user agent drawn from a small pool of current
//! desktop browsers plus the navigation headers a real browser would send.
//! Delays are jittered so request spacing never settles into a fixed rhythm.

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL,
    CONNECTION, DNT, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use std::time::Duration;

/// A user agent with the Chromium client hints that belong to it. Firefox and
/// Safari send no `sec-ch-ua` headers.
#[derive(Debug, Clone, Copy)]
pub struct BrowserProfile {
    pub user_agent: &'static str,
    pub client_hints: Option<ClientHints>,
}

#[derive(Debug, Clone, Copy)]
pub struct ClientHints {
    pub brand: &'static str,
    pub platform: &'static str,
}

const CHROME_123: &str = r#""Google Chrome";v="123", "Not:A-Brand";v="8", "Chromium";v="123""#;

pub const PROFILES: &[BrowserProfile] = &[
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints { brand: CHROME_123, platform: r#""Windows""# }),
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints { brand: CHROME_123, platform: r#""macOS""# }),
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        client_hints: None,
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints { brand: CHROME_123, platform: r#""Linux""# }),
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        client_hints: None,
    },
];

/// Older builds, used when a retry should look like another browser.
pub const RETRY_PROFILES: &[BrowserProfile] = &[
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints {
            brand: r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#,
            platform: r#""macOS""#,
        }),
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints {
            brand: r#""Chromium";v="122", "Not(A:Brand";v="24", "Google Chrome";v="122""#,
            platform: r#""Windows""#,
        }),
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        client_hints: Some(ClientHints {
            brand: r#""Not A(Brand";v="99", "Google Chrome";v="121", "Chromium";v="121""#,
            platform: r#""Linux""#,
        }),
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
        client_hints: None,
    },
];

const DEFAULT_DELAY_MULTIPLIER: f64 = 2.5;

#[derive(Debug, Clone)]
pub struct FingerprintGenerator {
    delay_multiplier: f64,
}

impl Default for FingerprintGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintGenerator {
    pub fn new() -> Self {
        Self {
            delay_multiplier: DEFAULT_DELAY_MULTIPLIER,
        }
    }

    /// Multipliers below 1.0 are clamped to 1.0 so the range never inverts.
    pub fn with_delay_multiplier(mut self, multiplier: f64) -> Self {
        self.delay_multiplier = multiplier.max(1.0);
        self
    }

    pub fn generate_headers(&self) -> HeaderMap {
        Self::headers_for(Self::pick(PROFILES))
    }

    /// Headers for a second attempt: another browser build with its own client hints.
    pub fn generate_retry_headers(&self) -> HeaderMap {
        Self::headers_for(Self::pick(RETRY_PROFILES))
    }

    fn pick(profiles: &'static [BrowserProfile]) -> &'static BrowserProfile {
        profiles.choose(&mut rand::thread_rng()).unwrap_or(&profiles[0])
    }

    fn headers_for(profile: &BrowserProfile) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(profile.user_agent));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("document"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("navigate"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("none"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-user"),
            HeaderValue::from_static("?1"),
        );

        if let Some(hints) = profile.client_hints {
            headers.insert(
                HeaderName::from_static("sec-ch-ua"),
                HeaderValue::from_static(hints.brand),
            );
            headers.insert(
                HeaderName::from_static("sec-ch-ua-mobile"),
                HeaderValue::from_static("?0"),
            );
            headers.insert(
                HeaderName::from_static("sec-ch-ua-platform"),
                HeaderValue::from_static(hints.platform),
            );
        }
        headers
    }

    /// Uniform in `[base, base * multiplier]`. The caller does the waiting.
    pub fn generate_delay(&self, base: Duration) -> Duration {
        if base.is_zero() {
            return base;
        }
        let factor = rand::thread_rng().gen_range(1.0..=self.delay_multiplier);
        base.mul_f64(factor)
    }
}
