//! Configuration types for tiktok-dl

use crate::types::ScrapeKind;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Main configuration for [`TikTokScraper`](crate::TikTokScraper)
///
/// Fields are organized into logical sub-configs:
/// - [`target`](TargetConfig) — what to scrape and how much of it
/// - [`network`](NetworkConfig) — hosts, user agent, proxies, timeouts
/// - [`scraping`](ScrapingConfig) — page size and concurrency widths
/// - [`watermark`](WatermarkConfig) — no-watermark URL resolution
/// - [`history`](HistoryConfig) — cross-run dedup and download tracking
/// - [`auth`](AuthConfig) — pre-supplied session token / signature
///
/// Sub-config fields are flattened for serialization, so the JSON/TOML
/// format stays flat (no nesting), except `target` and `history` which are
/// nested on purpose (they name a specific scrape job, not ambient behavior).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// The scrape target (kind, input, target count)
    pub target: TargetConfig,

    /// Network settings (hosts, user agent, proxies, timeouts)
    #[serde(flatten)]
    pub network: NetworkConfig,

    /// Pagination settings (page size, concurrency width, page cap)
    #[serde(flatten)]
    pub scraping: ScrapingConfig,

    /// No-watermark URL resolution settings
    #[serde(flatten)]
    pub watermark: WatermarkConfig,

    /// Cross-run history settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Pre-supplied authentication material
    #[serde(flatten)]
    pub auth: AuthConfig,
}

/// The scrape target: what to paginate and how much of it to collect
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target kind (user feed, hashtag feed, trend feed, music feed)
    pub kind: ScrapeKind,

    /// Raw target input: username, hashtag name, or music id.
    /// Ignored for the trend feed.
    #[serde(default)]
    pub input: String,

    /// Treat `input` as an already-resolved numeric user id, skipping the
    /// one-time user lookup (user kind only)
    #[serde(default)]
    pub by_user_id: bool,

    /// Stop once this many posts have been collected (None = until the feed
    /// is exhausted, capped at `max_pages` pages)
    #[serde(default)]
    pub target_count: Option<usize>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            kind: ScrapeKind::Trend,
            input: String::new(),
            by_user_id: false,
            target_count: None,
        }
    }
}

/// Network settings: hosts, user agent, proxies, timeouts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// API host for feed pages and lookups (default: "https://m.tiktok.com/")
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Web host for the session-token bootstrap page
    /// (default: "https://www.tiktok.com/")
    #[serde(default = "default_web_host")]
    pub web_host: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Proxy pool; one entry is chosen at random per request.
    /// `socks4://`/`socks5://` entries route through SOCKS, everything else
    /// through plain HTTP. Empty = direct connection.
    #[serde(default)]
    pub proxies: Vec<String>,

    /// Per-request timeout (default: 10 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Optional pause after each request, for rate-limit dodging
    #[serde(default, with = "optional_duration_serde")]
    pub request_delay: Option<Duration>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            web_host: default_web_host(),
            user_agent: default_user_agent(),
            proxies: vec![],
            request_timeout: default_request_timeout(),
            request_delay: None,
        }
    }
}

/// Pagination settings: page size and concurrency
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrapingConfig {
    /// Items requested per page (default: 30)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Concurrent page fetches for offset-cursor kinds (hashtag/music).
    /// Cursor-dependent kinds (user/trend) are always serialized to 1.
    /// Default: 3.
    #[serde(default = "default_async_scraping")]
    pub async_scraping: usize,

    /// Upper bound on planned pages when no target count is set (default: 1000)
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            async_scraping: default_async_scraping(),
            max_pages: default_max_pages(),
        }
    }
}

/// No-watermark URL resolution settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Resolve a direct no-watermark media URL per collected post
    /// (best-effort; failures leave the field empty)
    #[serde(default)]
    pub no_watermark: bool,

    /// Request the higher-bitrate 1080p variant when synthesizing the
    /// no-watermark URL
    #[serde(default)]
    pub hd_video: bool,
}

/// Cross-run history settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Enable durable cross-run dedup and download tracking
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding `tiktok_history.json` and the per-target id stores
    /// (default: the OS temp directory)
    #[serde(default = "default_history_dir")]
    pub dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_history_dir(),
        }
    }
}

/// Pre-supplied authentication material
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session token for request signing. When absent, one is bootstrapped
    /// at session start from an unauthenticated fetch of the discover page.
    #[serde(default)]
    pub session_token: Option<String>,

    /// Pre-computed signature, consumed by exactly one request; fresh
    /// signatures are computed for every subsequent request
    #[serde(default)]
    pub signature: Option<String>,
}

// Default value functions
fn default_api_host() -> String {
    "https://m.tiktok.com/".to_string()
}

fn default_web_host() -> String {
    "https://www.tiktok.com/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/80.0.3987.149 Safari/537.36"
        .to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_page_size() -> usize {
    30
}

fn default_async_scraping() -> usize {
    3
}

fn default_max_pages() -> usize {
    1000
}

fn default_history_dir() -> PathBuf {
    std::env::temp_dir()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
