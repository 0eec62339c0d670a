use serde::{Deserialize, Serialize};
use std::{env, str::FromStr, time::Duration};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteConfig {
    pub base_url: String,
    pub download_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.vgmusic.com/music/console".to_string(),
            download_dir: "Midis".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimits {
    pub min_interval_secs: f64,
}

impl RateLimits {
    pub fn min_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.min_interval_secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            min_interval_secs: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapingConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; VGMusicMidiScraper/0.1)".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        // A single attempt: failures surface immediately
        Self {
            max_attempts: 1,
            initial_delay_ms: 1000,
        }
    }
}

/// What a run does when a device index page cannot be fetched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorPolicy {
    /// Stop processing the remaining devices.
    #[default]
    Abort,
    /// Log the failure and move on to the next device.
    SkipDevice,
}

impl FromStr for PageErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" | "skip_device" => Ok(Self::SkipDevice),
            other => Err(format!("Unknown page error policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScraperConfig {
    pub site: SiteConfig,
    pub rate_limits: RateLimits,
    pub scraping: ScrapingConfig,
    pub retry: RetryConfig,
    pub on_page_error: PageErrorPolicy,
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = env::var("VGMUSIC_BASE_URL") {
            config.site.base_url = base_url;
        }
        if let Ok(dir) = env::var("VGMUSIC_DOWNLOAD_DIR") {
            config.site.download_dir = dir;
        }
        if let Some(secs) = parse_var::<f64>("RATE_LIMIT_INTERVAL_SECS") {
            if secs.is_finite() && secs >= 0.0 {
                config.rate_limits.min_interval_secs = secs;
            } else {
                warn!("Ignoring out-of-range RATE_LIMIT_INTERVAL_SECS: {}", secs);
            }
        }
        if let Ok(user_agent) = env::var("SCRAPER_USER_AGENT") {
            config.scraping.user_agent = user_agent;
        }
        if let Some(timeout) = parse_var::<u64>("SCRAPER_TIMEOUT_SECS") {
            config.scraping.request_timeout_secs = timeout;
        }
        if let Some(attempts) = parse_var::<u32>("SCRAPER_MAX_ATTEMPTS") {
            config.retry.max_attempts = attempts.max(1);
        }
        if let Some(delay) = parse_var::<u64>("SCRAPER_RETRY_DELAY_MS") {
            config.retry.initial_delay_ms = delay;
        }
        if let Some(policy) = parse_var::<PageErrorPolicy>("SCRAPER_ON_PAGE_ERROR") {
            config.on_page_error = policy;
        }

        config
    }
}
